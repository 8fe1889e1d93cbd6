use crate::constants::MESSAGE_OK;
use serde::{Deserialize, Serialize};

/// Uniform `{code, message, data}` wrapper for every response body.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
	pub code: u16,
	pub message: String,
	pub data: Option<T>,
}

impl<T> ApiResponse<T> {
	pub fn ok(data: T) -> Self {
		Self { code: 200, message: MESSAGE_OK.to_string(), data: Some(data) }
	}

	pub fn created(data: T) -> Self {
		Self { code: 201, message: "created".to_string(), data: Some(data) }
	}

	pub fn with_message(code: u16, message: impl Into<String>, data: T) -> Self {
		Self { code, message: message.into(), data: Some(data) }
	}

	pub fn error(code: u16, message: impl Into<String>) -> Self {
		Self { code, message: message.into(), data: None }
	}
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub page: i64,
	pub limit: i64,
	pub total: i64,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct PageRequest {
	pub page: Option<i64>,
	pub limit: Option<i64>,
}

/// Resolved paging window: 1-based page, clamped limit and row offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
	pub page: i64,
	pub limit: i64,
	pub offset: i64,
}

impl PageRequest {
	pub fn window(&self, default_limit: i64, max_limit: i64) -> PageWindow {
		let page = self.page.unwrap_or(1).max(1);
		let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);
		PageWindow { page, limit, offset: (page - 1) * limit }
	}
}

impl PageWindow {
	pub fn wrap<T>(self, items: Vec<T>, total: i64) -> Page<T> {
		Page { items, page: self.page, limit: self.limit, total }
	}
}
