use crate::schema::{approval_thresholds, pending_transactions, pending_user_status_changes};
use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

string_enum!(PendingStatus {
	Pending => "pending",
	Approved => "approved",
	Rejected => "rejected",
	Expired => "expired",
});

string_enum!(Priority {
	Low => "low",
	Normal => "normal",
	High => "high",
	Critical => "critical",
});

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = approval_thresholds)]
#[diesel(check_for_backend(Pg))]
pub struct ApprovalThreshold {
	pub id: i64,
	pub transaction_type: String,
	pub amount_threshold: i64,
	pub requires_dual_approval: bool,
	pub dual_approval_threshold: Option<i64>,
	pub auto_expire_hours: i32,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = approval_thresholds)]
#[diesel(treat_none_as_null = true)]
pub struct ThresholdValues<'a> {
	pub transaction_type: &'a str,
	pub amount_threshold: i64,
	pub requires_dual_approval: bool,
	pub dual_approval_threshold: Option<i64>,
	pub auto_expire_hours: i32,
	pub is_active: bool,
	pub updated_at: DateTime<Utc>,
}

/// Admin-initiated balance change awaiting a checker.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = pending_transactions)]
#[diesel(check_for_backend(Pg))]
pub struct PendingTransaction {
	pub id: i64,
	pub user_id: i64,
	pub maker_admin_id: i64,
	pub checker_admin_id: Option<i64>,
	pub transaction_type: String,
	pub amount: i64,
	pub current_balance: i64,
	pub expected_balance: i64,
	pub description: String,
	pub reason: String,
	pub status: String,
	pub priority: String,
	pub approval_threshold: i64,
	pub request_data: Option<serde_json::Value>,
	pub approval_comments: Option<String>,
	pub rejection_reason: Option<String>,
	pub expires_at: DateTime<Utc>,
	pub approved_at: Option<DateTime<Utc>>,
	pub rejected_at: Option<DateTime<Utc>>,
	pub processed_at: Option<DateTime<Utc>>,
	pub final_transaction_id: Option<i64>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = pending_transactions)]
pub struct NewPendingTransaction<'a> {
	pub user_id: i64,
	pub maker_admin_id: i64,
	pub transaction_type: &'a str,
	pub amount: i64,
	pub current_balance: i64,
	pub expected_balance: i64,
	pub description: &'a str,
	pub reason: &'a str,
	pub status: &'a str,
	pub priority: &'a str,
	pub approval_threshold: i64,
	pub request_data: Option<serde_json::Value>,
	pub expires_at: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = pending_user_status_changes)]
#[diesel(check_for_backend(Pg))]
pub struct PendingUserStatusChange {
	pub id: i64,
	pub user_id: i64,
	pub maker_admin_id: i64,
	pub checker_admin_id: Option<i64>,
	pub current_status: i16,
	pub requested_status: i16,
	pub reason: String,
	pub status: String,
	pub priority: String,
	pub approval_comments: Option<String>,
	pub rejection_reason: Option<String>,
	pub expires_at: DateTime<Utc>,
	pub approved_at: Option<DateTime<Utc>>,
	pub rejected_at: Option<DateTime<Utc>>,
	pub processed_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = pending_user_status_changes)]
pub struct NewPendingUserStatusChange<'a> {
	pub user_id: i64,
	pub maker_admin_id: i64,
	pub current_status: i16,
	pub requested_status: i16,
	pub reason: &'a str,
	pub status: &'a str,
	pub priority: &'a str,
	pub expires_at: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Filters shared by both pending queues; unused fields are ignored by the status queue.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct PendingFilter {
	pub status: Option<String>,
	pub transaction_type: Option<String>,
	pub priority: Option<String>,
	pub user_id: Option<i64>,
	pub maker_admin_id: Option<i64>,
	pub page: Option<i64>,
	pub limit: Option<i64>,
}
