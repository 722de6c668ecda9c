use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;

use super::{token, SESSION_COOKIE};
use crate::error::ApiError;
use crate::AppState;

/// The authenticated caller, extracted from the session cookie. Putting this
/// in a handler's signature is what marks the route as protected.
#[derive(Debug, Clone)]
pub struct AuthSession {
	pub email: String,
}

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
	for header in parts.headers.get_all(COOKIE) {
		let Ok(raw) = header.to_str() else { continue };
		for pair in raw.split(';') {
			if let Some((k, v)) = pair.trim().split_once('=') {
				if k == name {
					return Some(v.to_string());
				}
			}
		}
	}
	None
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
		let token = cookie_value(parts, SESSION_COOKIE).ok_or(ApiError::Unauthenticated)?;
		let claims =
			token::verify(&token, &state.jwt_secret).map_err(|_| ApiError::Unauthenticated)?;
		Ok(AuthSession { email: claims.email })
	}
}
