use crate::schema::{audit_logs, login_audits};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

string_enum!(AuditAction {
	Create => "CREATE",
	Read => "READ",
	Update => "UPDATE",
	Delete => "DELETE",
	Approve => "APPROVE",
	Reject => "REJECT",
	Deactivate => "DEACTIVATE",
	Login => "LOGIN",
	Logout => "LOGOUT",
});

string_enum!(LoginStatus {
	Success => "success",
	Failed => "failed",
	Blocked => "blocked",
});

string_enum!(LoginType {
	UserPin => "user_pin",
	AdminPassword => "admin_password",
	Logout => "logout",
});

/// Who performed an audited action. Exactly one id column is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
	User(i64),
	Admin(i64),
}

impl Actor {
	pub fn user_id(&self) -> Option<i64> {
		match self {
			Actor::User(id) => Some(*id),
			Actor::Admin(_) => None,
		}
	}

	pub fn admin_id(&self) -> Option<i64> {
		match self {
			Actor::Admin(id) => Some(*id),
			Actor::User(_) => None,
		}
	}
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = audit_logs)]
#[diesel(check_for_backend(Pg))]
pub struct AuditLog {
	pub id: i64,
	pub user_id: Option<i64>,
	pub admin_id: Option<i64>,
	pub entity_type: String,
	pub entity_id: String,
	pub action: String,
	pub old_values: Option<serde_json::Value>,
	pub new_values: Option<serde_json::Value>,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	pub api_endpoint: Option<String>,
	pub request_method: Option<String>,
	pub status_code: Option<i32>,
	pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = audit_logs)]
pub struct NewAuditLog {
	pub user_id: Option<i64>,
	pub admin_id: Option<i64>,
	pub entity_type: String,
	pub entity_id: String,
	pub action: String,
	pub old_values: Option<serde_json::Value>,
	pub new_values: Option<serde_json::Value>,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	pub api_endpoint: Option<String>,
	pub request_method: Option<String>,
	pub status_code: Option<i32>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = login_audits)]
#[diesel(check_for_backend(Pg))]
pub struct LoginAudit {
	pub id: i64,
	pub user_id: Option<i64>,
	pub admin_id: Option<i64>,
	pub login_type: String,
	pub status: String,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	pub failure_reason: Option<String>,
	pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = login_audits)]
pub struct NewLoginAudit {
	pub user_id: Option<i64>,
	pub admin_id: Option<i64>,
	pub login_type: String,
	pub status: String,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	pub failure_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct AuditFilter {
	pub entity_type: Option<String>,
	pub entity_id: Option<String>,
	pub user_id: Option<i64>,
	pub admin_id: Option<i64>,
	pub action: Option<String>,
	pub ip_address: Option<String>,
	/// Inclusive, whole days.
	pub date_from: Option<NaiveDate>,
	pub date_to: Option<NaiveDate>,
	pub page: Option<i64>,
	pub limit: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct LoginAuditFilter {
	pub user_id: Option<i64>,
	pub admin_id: Option<i64>,
	pub login_type: Option<String>,
	pub status: Option<String>,
	pub ip_address: Option<String>,
	pub date_from: Option<NaiveDate>,
	pub date_to: Option<NaiveDate>,
	pub page: Option<i64>,
	pub limit: Option<i64>,
}
