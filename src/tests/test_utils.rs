use crate::{
	db::{self, DbPool},
	midware::{context::Principal, jwt::JWT},
	services::audit::AuditContext,
};
use once_cell::sync::Lazy;
use std::sync::{Mutex, MutexGuard};

pub const TEST_SECRET: &str = "test_secret";

static POOL: Lazy<Option<DbPool>> = Lazy::new(|| {
	let url = std::env::var("TEST_DATABASE_URL").ok()?;
	let pool = match db::get_db_pool(&url, 24) {
		Ok(pool) => pool,
		Err(e) => {
			eprintln!("test database unavailable: {:#}", e);
			return None;
		},
	};
	if let Err(e) = db::init(&pool) {
		eprintln!("test migrations failed: {:#}", e);
		return None;
	}
	Some(pool)
});

/// Shared pool on `TEST_DATABASE_URL`; `None` means the database tests skip.
pub fn test_pool() -> Option<DbPool> {
	let pool = POOL.clone();
	if pool.is_none() {
		eprintln!("TEST_DATABASE_URL not set, skipping database test");
	}
	pool
}

static POLICY_LOCK: Mutex<()> = Mutex::new(());

/// Approval thresholds are global per kind; tests that rely on one hold this guard.
pub fn policy_guard() -> MutexGuard<'static, ()> {
	POLICY_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub fn test_context() -> AuditContext {
	AuditContext {
		ip_address: Some("127.0.0.1".to_string()),
		user_agent: Some("mobank-tests".to_string()),
		api_endpoint: Some("/test".to_string()),
		request_method: Some("POST".to_string()),
	}
}

pub fn generate_test_token(principal: &Principal) -> String {
	JWT::new(TEST_SECRET).create_jwt(principal, 3600).unwrap().0
}
