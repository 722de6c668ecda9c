use axum::{response::IntoResponse, response::Response, Json};
use hyper::StatusCode;
use serde_json::json;

use crate::store::StoreError;

/// Every failure a handler can report. Each variant carries the message that
/// ends up in the JSON body; the variant picks the status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("not logged in")]
	Unauthenticated,
	#[error("identity verification failed")]
	Unauthorized,
	#[error("{0}")]
	Forbidden(String),
	#[error("{0}")]
	Validation(String),
	#[error("{0}")]
	BadRequest(String),
	#[error("{0} not found")]
	NotFound(&'static str),
	#[error("internal server error")]
	Internal(#[from] anyhow::Error),
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::Unauthenticated | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
			ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
			ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn forbidden(msg: impl Into<String>) -> Self {
		ApiError::Forbidden(msg.into())
	}

	pub fn validation(msg: impl Into<String>) -> Self {
		ApiError::Validation(msg.into())
	}

	pub fn bad_request(msg: impl Into<String>) -> Self {
		ApiError::BadRequest(msg.into())
	}
}

impl From<StoreError> for ApiError {
	fn from(e: StoreError) -> Self {
		ApiError::Internal(anyhow::Error::new(e))
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if let ApiError::Internal(e) = &self {
			log::error!("internal error: {:?}", e);
		}
		let body = Json(json!({ "message": self.to_string() }));
		(self.status(), body).into_response()
	}
}
