use crate::models::ApiResponse;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use diesel::result::DatabaseErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
	#[error("{0}")]
	ValidationFailed(String),
	#[error("{0}")]
	Unauthorized(String),
	#[error("{0}")]
	Forbidden(String),
	#[error("{0} not found")]
	NotFound(&'static str),
	#[error("{0}")]
	Conflict(String),

	#[error("User not found")]
	UserNotFound,
	#[error("Bank account not found")]
	AccountNotFound,
	#[error("Cannot transfer to your own account")]
	SelfTransfer,
	#[error("Amount must be a positive integer")]
	InvalidAmount,
	#[error("Insufficient balance")]
	InsufficientFunds,

	#[error("Request has already been {0}")]
	AlreadyDecided(String),
	#[error("Request has expired")]
	Expired,
	#[error("Amount {amount} is below the approval threshold {threshold}")]
	BelowThreshold { amount: i64, threshold: i64 },
	#[error("No active approval threshold for {0}")]
	NoPolicy(String),
	#[error("Maker and checker must be different admins")]
	SegregationViolation,
	#[error("Rejection reason is required")]
	MissingReason,

	#[error("Database error: {0}")]
	Store(#[from] diesel::result::Error),
	#[error("Database connection error: {0}")]
	Pool(#[from] r2d2::Error),
	#[error("Internal error: {0}")]
	Internal(String),
}

impl AppError {
	pub fn kind(&self) -> &'static str {
		match self {
			AppError::ValidationFailed(_) | AppError::InvalidAmount | AppError::SelfTransfer |
			AppError::MissingReason => "ValidationFailed",
			AppError::Unauthorized(_) => "Unauthorized",
			AppError::Forbidden(_) | AppError::SegregationViolation => "Forbidden",
			AppError::NotFound(_) | AppError::UserNotFound | AppError::AccountNotFound =>
				"NotFound",
			AppError::Conflict(_) => "Conflict",
			AppError::InsufficientFunds => "InsufficientFunds",
			AppError::AlreadyDecided(_) => "AlreadyDecided",
			AppError::Expired => "Expired",
			AppError::BelowThreshold { .. } => "BelowThreshold",
			AppError::NoPolicy(_) => "NoPolicy",
			AppError::Store(e) => match e {
				diesel::result::Error::NotFound => "NotFound",
				diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) =>
					"Conflict",
				_ => "InternalError",
			},
			AppError::Pool(_) | AppError::Internal(_) => "InternalError",
		}
	}

	/// Message exposed to clients; store and pool details stay in the logs.
	fn public_message(&self) -> String {
		match self.kind() {
			"InternalError" => "Internal server error".to_string(),
			"Conflict" if matches!(self, AppError::Store(_)) =>
				"Resource already exists".to_string(),
			"NotFound" if matches!(self, AppError::Store(_)) => "Resource not found".to_string(),
			_ => self.to_string(),
		}
	}
}

impl ResponseError for AppError {
	fn status_code(&self) -> StatusCode {
		match self.kind() {
			"Unauthorized" => StatusCode::UNAUTHORIZED,
			"Forbidden" => StatusCode::FORBIDDEN,
			"NotFound" => StatusCode::NOT_FOUND,
			"Conflict" => StatusCode::CONFLICT,
			"InternalError" => StatusCode::INTERNAL_SERVER_ERROR,
			_ => StatusCode::BAD_REQUEST,
		}
	}

	fn error_response(&self) -> HttpResponse {
		let status = self.status_code();
		if status.is_server_error() {
			log::error!("Request failed: {:?}", self);
		} else {
			log::warn!("Request rejected ({}): {}", self.kind(), self);
		}
		HttpResponse::build(status)
			.json(ApiResponse::<()>::error(status.as_u16(), self.public_message()))
	}
}

impl From<actix_web::error::BlockingError> for AppError {
	fn from(err: actix_web::error::BlockingError) -> Self {
		AppError::Internal(err.to_string())
	}
}

impl From<bcrypt::BcryptError> for AppError {
	fn from(err: bcrypt::BcryptError) -> Self {
		AppError::Internal(format!("hashing failed: {}", err))
	}
}

impl From<jsonwebtoken::errors::Error> for AppError {
	fn from(err: jsonwebtoken::errors::Error) -> Self {
		AppError::Unauthorized(format!("Invalid token: {}", err))
	}
}

impl From<validator::ValidationErrors> for AppError {
	fn from(err: validator::ValidationErrors) -> Self {
		AppError::ValidationFailed(err.to_string())
	}
}

impl From<serde_json::Error> for AppError {
	fn from(err: serde_json::Error) -> Self {
		AppError::Internal(format!("serialization failed: {}", err))
	}
}
