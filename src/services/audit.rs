use crate::{
	constants::{AUDIT_PAGE_LIMIT, MAX_PAGE_LIMIT},
	error::AppError,
	models::{
		Actor, AuditAction, AuditFilter, AuditLog, LoginAudit, LoginAuditFilter, LoginStatus,
		LoginType, NewAuditLog, NewLoginAudit, Page, PageRequest,
	},
	repo::AuditRepo,
};
use diesel::{Connection, PgConnection};
use serde::Serialize;

/// Destination of audit rows. The database sink is the connection that served the request.
#[cfg_attr(test, mockall::automock)]
pub trait AuditSink {
	fn write(&mut self, entry: &NewAuditLog) -> Result<(), AppError>;
	fn write_login(&mut self, entry: &NewLoginAudit) -> Result<(), AppError>;
}

// A failed insert only rolls back its own savepoint when the caller still holds a transaction.
impl AuditSink for PgConnection {
	fn write(&mut self, entry: &NewAuditLog) -> Result<(), AppError> {
		self.transaction::<_, AppError, _>(|conn| AuditRepo::insert(conn, entry))
	}

	fn write_login(&mut self, entry: &NewLoginAudit) -> Result<(), AppError> {
		self.transaction::<_, AppError, _>(|conn| AuditRepo::insert_login(conn, entry))
	}
}

/// Request metadata copied onto every audit row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditContext {
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	pub api_endpoint: Option<String>,
	pub request_method: Option<String>,
}

/// One audit row under construction.
#[derive(Debug, Clone)]
pub struct AuditEntry {
	actor: Actor,
	action: AuditAction,
	entity_type: &'static str,
	entity_id: String,
	old_values: Option<serde_json::Value>,
	new_values: Option<serde_json::Value>,
}

impl AuditEntry {
	pub fn new(
		actor: Actor,
		action: AuditAction,
		entity_type: &'static str,
		entity_id: impl ToString,
	) -> Self {
		Self {
			actor,
			action,
			entity_type,
			entity_id: entity_id.to_string(),
			old_values: None,
			new_values: None,
		}
	}

	pub fn old<T: Serialize>(mut self, snapshot: &T) -> Self {
		self.old_values = snapshot_of(snapshot);
		self
	}

	pub fn new_values<T: Serialize>(mut self, snapshot: &T) -> Self {
		self.new_values = snapshot_of(snapshot);
		self
	}

	/// CREATE keeps only the new snapshot, DELETE only the old one, everything else both.
	pub fn build(self, ctx: &AuditContext, status_code: u16) -> NewAuditLog {
		let (old_values, new_values) = match self.action {
			AuditAction::Create => (None, self.new_values),
			AuditAction::Delete => (self.old_values, None),
			_ => (self.old_values, self.new_values),
		};
		NewAuditLog {
			user_id: self.actor.user_id(),
			admin_id: self.actor.admin_id(),
			entity_type: self.entity_type.to_string(),
			entity_id: self.entity_id,
			action: self.action.as_str().to_string(),
			old_values,
			new_values,
			ip_address: ctx.ip_address.clone(),
			user_agent: ctx.user_agent.clone(),
			api_endpoint: ctx.api_endpoint.clone(),
			request_method: ctx.request_method.clone(),
			status_code: Some(i32::from(status_code)),
		}
	}
}

fn snapshot_of<T: Serialize>(value: &T) -> Option<serde_json::Value> {
	match serde_json::to_value(value) {
		Ok(v) => Some(v),
		Err(e) => {
			log::warn!("Audit snapshot could not be serialized: {}", e);
			None
		},
	}
}

/// Emits audit rows for one request. Sink failures are logged and never surface.
pub struct AuditTrail {
	ctx: AuditContext,
}

impl AuditTrail {
	pub fn new(ctx: AuditContext) -> Self {
		Self { ctx }
	}

	pub fn context(&self) -> &AuditContext {
		&self.ctx
	}

	pub fn record(&self, sink: &mut dyn AuditSink, entry: AuditEntry, status_code: u16) {
		let row = entry.build(&self.ctx, status_code);
		if let Err(e) = sink.write(&row) {
			log::error!(
				"Audit write failed for {} {}#{}: {}",
				row.action,
				row.entity_type,
				row.entity_id,
				e
			);
		}
	}

	pub fn record_login(
		&self,
		sink: &mut dyn AuditSink,
		actor: Option<Actor>,
		login_type: LoginType,
		status: LoginStatus,
		failure_reason: Option<&str>,
	) {
		let row = NewLoginAudit {
			user_id: actor.and_then(|a| a.user_id()),
			admin_id: actor.and_then(|a| a.admin_id()),
			login_type: login_type.as_str().to_string(),
			status: status.as_str().to_string(),
			ip_address: self.ctx.ip_address.clone(),
			user_agent: self.ctx.user_agent.clone(),
			failure_reason: failure_reason.map(str::to_string),
		};
		if let Err(e) = sink.write_login(&row) {
			log::error!("Login audit write failed ({} {}): {}", row.login_type, row.status, e);
		}
	}
}

pub fn query_logs(
	conn: &mut PgConnection,
	filter: &AuditFilter,
) -> Result<Page<AuditLog>, AppError> {
	if let Some(action) = filter.action.as_deref() {
		action.parse::<AuditAction>()?;
	}
	let window =
		PageRequest { page: filter.page, limit: filter.limit }.window(AUDIT_PAGE_LIMIT, MAX_PAGE_LIMIT);
	let (items, total) = AuditRepo::page(conn, filter, window)?;
	Ok(window.wrap(items, total))
}

pub fn query_logins(
	conn: &mut PgConnection,
	filter: &LoginAuditFilter,
) -> Result<Page<LoginAudit>, AppError> {
	if let Some(status) = filter.status.as_deref() {
		status.parse::<LoginStatus>()?;
	}
	if let Some(login_type) = filter.login_type.as_deref() {
		login_type.parse::<LoginType>()?;
	}
	let window =
		PageRequest { page: filter.page, limit: filter.limit }.window(AUDIT_PAGE_LIMIT, MAX_PAGE_LIMIT);
	let (items, total) = AuditRepo::page_logins(conn, filter, window)?;
	Ok(window.wrap(items, total))
}

#[cfg(test)]
mod tests {
	use super::*;
	use mockall::predicate::always;
	use serde_json::json;

	fn ctx() -> AuditContext {
		AuditContext {
			ip_address: Some("10.0.0.7".into()),
			user_agent: Some("okhttp/4".into()),
			api_endpoint: Some("/admin/thresholds".into()),
			request_method: Some("PUT".into()),
		}
	}

	#[test]
	fn test_create_keeps_only_new_snapshot() {
		let row = AuditEntry::new(Actor::Admin(3), AuditAction::Create, "pending_transaction", 9)
			.old(&json!({"ignored": true}))
			.new_values(&json!({"amount": 5}))
			.build(&ctx(), 201);
		assert_eq!(row.admin_id, Some(3));
		assert_eq!(row.user_id, None);
		assert_eq!(row.entity_id, "9");
		assert_eq!(row.action, "CREATE");
		assert!(row.old_values.is_none());
		assert_eq!(row.new_values, Some(json!({"amount": 5})));
		assert_eq!(row.status_code, Some(201));
		assert_eq!(row.ip_address.as_deref(), Some("10.0.0.7"));
	}

	#[test]
	fn test_delete_keeps_only_old_snapshot() {
		let row = AuditEntry::new(Actor::User(4), AuditAction::Delete, "bank_account", 1)
			.old(&json!({"n": 1}))
			.new_values(&json!({"n": 2}))
			.build(&AuditContext::default(), 200);
		assert_eq!(row.user_id, Some(4));
		assert_eq!(row.old_values, Some(json!({"n": 1})));
		assert!(row.new_values.is_none());
	}

	#[test]
	fn test_decisions_keep_both_snapshots() {
		for action in [AuditAction::Update, AuditAction::Approve, AuditAction::Reject] {
			let row = AuditEntry::new(Actor::Admin(1), action, "pending_transaction", 2)
				.old(&json!({"status": "pending"}))
				.new_values(&json!({"status": "done"}))
				.build(&AuditContext::default(), 200);
			assert!(row.old_values.is_some(), "{}", action);
			assert!(row.new_values.is_some(), "{}", action);
		}
	}

	#[test]
	fn test_sink_failure_is_swallowed() {
		let mut sink = MockAuditSink::new();
		sink.expect_write()
			.with(always())
			.times(1)
			.returning(|_| Err(AppError::Internal("audit table locked".into())));
		let trail = AuditTrail::new(ctx());
		trail.record(&mut sink, AuditEntry::new(Actor::Admin(1), AuditAction::Approve, "x", 1), 200);
	}

	#[test]
	fn test_login_rows_carry_request_context() {
		let mut sink = MockAuditSink::new();
		sink.expect_write_login()
			.withf(|row| {
				row.user_id == Some(8) &&
					row.admin_id.is_none() &&
					row.login_type == "user_pin" &&
					row.status == "failed" &&
					row.failure_reason.as_deref() == Some("invalid pin") &&
					row.ip_address.as_deref() == Some("10.0.0.7")
			})
			.times(1)
			.returning(|_| Ok(()));
		let trail = AuditTrail::new(ctx());
		trail.record_login(
			&mut sink,
			Some(Actor::User(8)),
			LoginType::UserPin,
			LoginStatus::Failed,
			Some("invalid pin"),
		);
	}
}
