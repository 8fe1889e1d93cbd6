use crate::{
	error::AppError,
	models::{
		dashboard::{ApprovalRollup, BucketBounds, BucketTotals, LedgerPoint},
		PendingStatus, Priority, TransactionStatus,
	},
	schema::{pending_transactions, transactions},
};
use chrono::{DateTime, Utc};
use diesel::{
	prelude::*,
	sql_types::{Array, BigInt, Text, Timestamptz},
};

const BUCKET_SQL: &str = r#"
SELECT
	COUNT(*) FILTER (WHERE created_at >= $1) AS today_count,
	COUNT(*) FILTER (WHERE created_at >= $2) AS week_count,
	COUNT(*) FILTER (WHERE created_at >= $3) AS month_count,
	COUNT(*) FILTER (WHERE created_at >= $4) AS year_count,
	COUNT(*) FILTER (WHERE created_at >= $5) AS last_7_count,
	COUNT(*) FILTER (WHERE created_at >= $6) AS last_30_count,
	COUNT(*) AS all_count,
	COALESCE(SUM(amount) FILTER (WHERE created_at >= $1 AND transaction_type = ANY($8)), 0)::BIGINT AS today_amount,
	COALESCE(SUM(amount) FILTER (WHERE created_at >= $2 AND transaction_type = ANY($8)), 0)::BIGINT AS week_amount,
	COALESCE(SUM(amount) FILTER (WHERE created_at >= $3 AND transaction_type = ANY($8)), 0)::BIGINT AS month_amount,
	COALESCE(SUM(amount) FILTER (WHERE created_at >= $4 AND transaction_type = ANY($8)), 0)::BIGINT AS year_amount,
	COALESCE(SUM(amount) FILTER (WHERE created_at >= $5 AND transaction_type = ANY($8)), 0)::BIGINT AS last_7_amount,
	COALESCE(SUM(amount) FILTER (WHERE created_at >= $6 AND transaction_type = ANY($8)), 0)::BIGINT AS last_30_amount,
	COALESCE(SUM(amount) FILTER (WHERE transaction_type = ANY($8)), 0)::BIGINT AS all_amount
FROM transactions
WHERE status = 'completed' AND transaction_type = ANY($7)
"#;

#[derive(QueryableByName, Debug, Default)]
struct BucketRow {
	#[diesel(sql_type = BigInt)]
	today_count: i64,
	#[diesel(sql_type = BigInt)]
	week_count: i64,
	#[diesel(sql_type = BigInt)]
	month_count: i64,
	#[diesel(sql_type = BigInt)]
	year_count: i64,
	#[diesel(sql_type = BigInt)]
	last_7_count: i64,
	#[diesel(sql_type = BigInt)]
	last_30_count: i64,
	#[diesel(sql_type = BigInt)]
	all_count: i64,
	#[diesel(sql_type = BigInt)]
	today_amount: i64,
	#[diesel(sql_type = BigInt)]
	week_amount: i64,
	#[diesel(sql_type = BigInt)]
	month_amount: i64,
	#[diesel(sql_type = BigInt)]
	year_amount: i64,
	#[diesel(sql_type = BigInt)]
	last_7_amount: i64,
	#[diesel(sql_type = BigInt)]
	last_30_amount: i64,
	#[diesel(sql_type = BigInt)]
	all_amount: i64,
}

pub struct DashboardRepo;

impl DashboardRepo {
	/// Counts every completed row whose type is in `counted`, sums only those in `summed`.
	pub fn bucket_totals(
		conn: &mut PgConnection,
		bounds: &BucketBounds,
		counted: &[&str],
		summed: &[&str],
	) -> Result<(BucketTotals, BucketTotals), AppError> {
		let counted: Vec<String> = counted.iter().map(|s| s.to_string()).collect();
		let summed: Vec<String> = summed.iter().map(|s| s.to_string()).collect();
		let row = diesel::sql_query(BUCKET_SQL)
			.bind::<Timestamptz, _>(bounds.today)
			.bind::<Timestamptz, _>(bounds.this_week)
			.bind::<Timestamptz, _>(bounds.this_month)
			.bind::<Timestamptz, _>(bounds.this_year)
			.bind::<Timestamptz, _>(bounds.last_7_days)
			.bind::<Timestamptz, _>(bounds.last_30_days)
			.bind::<Array<Text>, _>(counted)
			.bind::<Array<Text>, _>(summed)
			.get_result::<BucketRow>(conn)
			.optional()?
			.unwrap_or_default();

		let counts = BucketTotals {
			today: row.today_count,
			this_week: row.week_count,
			this_month: row.month_count,
			this_year: row.year_count,
			last_7_days: row.last_7_count,
			last_30_days: row.last_30_count,
			all_time: row.all_count,
		};
		let amounts = BucketTotals {
			today: row.today_amount,
			this_week: row.week_amount,
			this_month: row.month_amount,
			this_year: row.year_amount,
			last_7_days: row.last_7_amount,
			last_30_days: row.last_30_amount,
			all_time: row.all_amount,
		};
		Ok((counts, amounts))
	}

	/// Completed ledger rows created at or after `since`, oldest first.
	pub fn ledger_points_since(
		conn: &mut PgConnection,
		since: DateTime<Utc>,
	) -> Result<Vec<LedgerPoint>, AppError> {
		let rows = transactions::table
			.filter(transactions::status.eq(TransactionStatus::Completed.as_str()))
			.filter(transactions::created_at.ge(since))
			.order((transactions::created_at.asc(), transactions::id.asc()))
			.select((transactions::created_at, transactions::transaction_type, transactions::amount))
			.load::<(DateTime<Utc>, String, i64)>(conn)?;
		Ok(rows
			.into_iter()
			.map(|(created_at, transaction_type, amount)| LedgerPoint {
				created_at,
				transaction_type,
				amount,
			})
			.collect())
	}

	pub fn approval_rollup(
		conn: &mut PgConnection,
		today: DateTime<Utc>,
	) -> Result<ApprovalRollup, AppError> {
		let pending = PendingStatus::Pending.as_str();
		let count_pending_with = |conn: &mut PgConnection, priority: &str| {
			pending_transactions::table
				.filter(pending_transactions::status.eq(pending))
				.filter(pending_transactions::priority.eq(priority.to_string()))
				.count()
				.get_result::<i64>(conn)
		};

		Ok(ApprovalRollup {
			pending: pending_transactions::table
				.filter(pending_transactions::status.eq(pending))
				.count()
				.get_result(conn)?,
			approved_today: pending_transactions::table
				.filter(pending_transactions::status.eq(PendingStatus::Approved.as_str()))
				.filter(pending_transactions::approved_at.ge(today))
				.count()
				.get_result(conn)?,
			rejected_today: pending_transactions::table
				.filter(pending_transactions::status.eq(PendingStatus::Rejected.as_str()))
				.filter(pending_transactions::rejected_at.ge(today))
				.count()
				.get_result(conn)?,
			expired: pending_transactions::table
				.filter(pending_transactions::status.eq(PendingStatus::Expired.as_str()))
				.count()
				.get_result(conn)?,
			high_priority_pending: count_pending_with(conn, Priority::High.as_str())?,
			critical_priority_pending: count_pending_with(conn, Priority::Critical.as_str())?,
		})
	}
}
