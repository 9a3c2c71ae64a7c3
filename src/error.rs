/*
 * src/error.rs
 *
 * File for the application error types
 *
 * Purpose:
 *   Split errors into what the client may see (PublicError) and what stays in
 *   the logs (PrivateError). Handlers return ApiResult<T>; AppError renders
 *   the `{"success": false, "error": "..."}` envelope.
 */

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, AppError>;

/// Errors that are safe to surface verbatim to the client.
#[derive(Debug, thiserror::Error)]
pub enum PublicError {
	/// Bad coordinates, empty name, malformed body, unknown preference option.
	#[error("{0}")]
	Validation(String),
	#[error("unauthorized")]
	Unauthorized,
	#[error("not found")]
	NotFound,
	#[error("{0}")]
	Conflict(String),
	/// LLM transport/schema/parse failure that could not be degraded away.
	#[error("upstream model failure: {0}")]
	UpstreamLlm(String),
	#[error("request deadline exceeded")]
	Timeout,
}

/// Errors whose details must not cross the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum PrivateError {
	#[error("database error: {0}")]
	Db(#[from] sqlx::Error),
	#[error("stream channel error: {0}")]
	Channel(String),
	#[error("{0}")]
	Internal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error(transparent)]
	Public(#[from] PublicError),
	#[error(transparent)]
	Private(#[from] PrivateError),
}

impl AppError {
	pub fn internal(msg: impl Into<String>) -> Self {
		AppError::Private(PrivateError::Internal(msg.into()))
	}

	pub fn validation(msg: impl Into<String>) -> Self {
		AppError::Public(PublicError::Validation(msg.into()))
	}

	pub fn status(&self) -> StatusCode {
		match self {
			AppError::Public(PublicError::Validation(_)) => StatusCode::BAD_REQUEST,
			AppError::Public(PublicError::Unauthorized) => StatusCode::UNAUTHORIZED,
			AppError::Public(PublicError::NotFound) => StatusCode::NOT_FOUND,
			AppError::Public(PublicError::Conflict(_)) => StatusCode::CONFLICT,
			AppError::Public(PublicError::UpstreamLlm(_)) => StatusCode::BAD_GATEWAY,
			AppError::Public(PublicError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
			AppError::Private(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Message rendered into the error envelope. Private errors collapse to a
	/// generic string; the detail goes to the log instead.
	pub fn public_message(&self) -> String {
		match self {
			AppError::Public(e) => e.to_string(),
			AppError::Private(_) => String::from("internal server error"),
		}
	}
}

impl From<sqlx::Error> for AppError {
	fn from(e: sqlx::Error) -> Self {
		match e {
			sqlx::Error::RowNotFound => AppError::Public(PublicError::NotFound),
			other => AppError::Private(PrivateError::Db(other)),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		if let AppError::Private(ref inner) = self {
			error!("private error surfaced to handler boundary: {inner}");
		}
		let body = Json(json!({
			"success": false,
			"error": self.public_message(),
		}));
		(self.status(), body).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn statuses_match_error_kinds() {
		assert_eq!(
			AppError::validation("bad lat").status(),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(
			AppError::Public(PublicError::Unauthorized).status(),
			StatusCode::UNAUTHORIZED
		);
		assert_eq!(
			AppError::Public(PublicError::NotFound).status(),
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			AppError::Public(PublicError::Conflict(String::from("title taken"))).status(),
			StatusCode::CONFLICT
		);
		assert_eq!(
			AppError::Public(PublicError::UpstreamLlm(String::from("parse"))).status(),
			StatusCode::BAD_GATEWAY
		);
		assert_eq!(
			AppError::internal("boom").status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn private_detail_never_leaks() {
		let err = AppError::internal("connection string was postgres://user:pw@host");
		assert_eq!(err.public_message(), "internal server error");
	}

	#[test]
	fn row_not_found_becomes_not_found() {
		let err = AppError::from(sqlx::Error::RowNotFound);
		assert_eq!(err.status(), StatusCode::NOT_FOUND);
	}
}
