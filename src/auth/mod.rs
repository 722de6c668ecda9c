pub mod guard;
pub mod token;
pub mod verifier;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde_json::{json, Value};

use crate::config::Environment;
use crate::error::ApiError;
use crate::AppState;
use verifier::VerifyError;

pub const SESSION_COOKIE: &str = "token";

/// Cookie attributes differ by environment: browsers only allow
/// SameSite=None together with Secure, and local development has no TLS.
fn session_cookie(value: &str, max_age: i64, env: Environment) -> String {
	let attrs = match env {
		Environment::Production => "SameSite=None; Secure",
		Environment::Development => "SameSite=Lax",
	};
	format!(
		"{}={}; HttpOnly; Path=/; Max-Age={}; {}",
		SESSION_COOKIE, value, max_age, attrs
	)
}

/// POST /auth/jwt. Hands the assertion to the identity verifier and, when it
/// checks out, mints the 7-day session cookie for the verified email.
pub async fn issue_jwt(
	State(state): State<AppState>,
	body: Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
	let assertion = body
		.get("token")
		.and_then(Value::as_str)
		.filter(|t| !t.is_empty())
		.ok_or_else(|| ApiError::validation("token is required"))?;

	let email = state.verifier.verify(assertion).await.map_err(|e| match e {
		VerifyError::Rejected => ApiError::Unauthorized,
		VerifyError::Upstream(e) => ApiError::Internal(e.into()),
	})?;

	let jwt = token::mint(&email, &state.jwt_secret)
		.map_err(|e| ApiError::Internal(e.into()))?;
	log::info!("session issued for {}", email);

	let max_age = token::TOKEN_TTL_DAYS * 24 * 60 * 60;
	let cookie = session_cookie(&jwt, max_age, state.environment);
	Ok((
		AppendHeaders([(SET_COOKIE, cookie)]),
		Json(json!({ "message": "success", "email": email })),
	))
}

/// POST /auth/logout. Clears the cookie unconditionally; no session check,
/// calling it twice is the same as calling it once.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
	let cookie = session_cookie("", 0, state.environment);
	(
		AppendHeaders([(SET_COOKIE, cookie)]),
		Json(json!({ "message": "logged out" })),
	)
}
