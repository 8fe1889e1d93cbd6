use crate::models::ApiResponse;
use actix_web::{HttpResponse, Responder};
use serde_json::json;

pub mod admin;
pub mod approval;
pub mod auth;
pub mod transaction;
pub mod user;

pub use admin::AdminHandler;
pub use approval::ApprovalHandler;
pub use auth::AuthHandler;
pub use transaction::TransactionHandler;
pub use user::UserHandler;

pub async fn health_handler() -> impl Responder {
	HttpResponse::Ok().json(ApiResponse::ok(json!({
		"status": "up",
		"service": env!("CARGO_PKG_NAME"),
		"version": env!("CARGO_PKG_VERSION"),
	})))
}
