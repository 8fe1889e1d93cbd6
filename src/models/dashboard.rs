use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BucketTotals {
	pub today: i64,
	pub this_week: i64,
	pub this_month: i64,
	pub this_year: i64,
	pub last_7_days: i64,
	pub last_30_days: i64,
	pub all_time: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SeriesPoint {
	pub period_label: String,
	pub count: i64,
	pub amount: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CategoryStats {
	pub counts: BucketTotals,
	pub amounts: BucketTotals,
	pub last_7_days_series: Vec<SeriesPoint>,
	pub last_30_days_series: Vec<SeriesPoint>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalRollup {
	pub pending: i64,
	pub approved_today: i64,
	pub rejected_today: i64,
	pub expired: i64,
	pub high_priority_pending: i64,
	pub critical_priority_pending: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardSummary {
	pub total: CategoryStats,
	pub topup: CategoryStats,
	pub withdraw: CategoryStats,
	pub transfer: CategoryStats,
	pub approvals: ApprovalRollup,
	pub generated_at: DateTime<Utc>,
}

/// Lower bounds (inclusive) of every rollup window, resolved in the serving process's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketBounds {
	pub today: DateTime<Utc>,
	pub this_week: DateTime<Utc>,
	pub this_month: DateTime<Utc>,
	pub this_year: DateTime<Utc>,
	pub last_7_days: DateTime<Utc>,
	pub last_30_days: DateTime<Utc>,
}

/// One completed ledger row as seen by the series builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPoint {
	pub created_at: DateTime<Utc>,
	pub transaction_type: String,
	pub amount: i64,
}
