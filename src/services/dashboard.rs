use crate::{
	error::AppError,
	models::{
		dashboard::{BucketBounds, CategoryStats, DashboardSummary, LedgerPoint, SeriesPoint},
		TransactionType,
	},
	repo::{DashboardRepo, PendingTransactionRepo, StatusChangeRepo},
};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone, Utc};
use diesel::PgConnection;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
	Total,
	Topup,
	Withdraw,
	Transfer,
}

impl Category {
	/// Ledger kinds whose rows are counted.
	pub fn counted(&self) -> &'static [TransactionType] {
		match self {
			Category::Total => TransactionType::ALL,
			Category::Topup => &[TransactionType::Topup],
			Category::Withdraw => &[TransactionType::Withdraw],
			Category::Transfer => &[TransactionType::TransferOut, TransactionType::TransferIn],
		}
	}

	/// Ledger kinds whose amounts are summed. Only the outgoing leg of a transfer is summed, and
	/// `balance_set` is left out because its amount is a target balance, not a movement.
	pub fn summed(&self) -> &'static [TransactionType] {
		match self {
			Category::Total => &[
				TransactionType::Topup,
				TransactionType::Withdraw,
				TransactionType::TransferOut,
				TransactionType::BalanceAdjustment,
			],
			Category::Topup => &[TransactionType::Topup],
			Category::Withdraw => &[TransactionType::Withdraw],
			Category::Transfer => &[TransactionType::TransferOut],
		}
	}
}

fn names(kinds: &[TransactionType]) -> Vec<&'static str> {
	kinds.iter().map(|k| k.as_str()).collect()
}

fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
	let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
	tz.from_local_datetime(&naive)
		.earliest()
		.map(|d| d.with_timezone(&Utc))
		.unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Window starts for `now`, in `now`'s own zone. Weeks begin on Monday.
pub fn bucket_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> BucketBounds {
	let tz = now.timezone();
	let today = now.date_naive();
	let back = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(today);
	let week_start = back(u64::from(today.weekday().num_days_from_monday()));
	let month_start = today.with_day(1).unwrap_or(today);
	let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);

	BucketBounds {
		today: midnight(&tz, today),
		this_week: midnight(&tz, week_start),
		this_month: midnight(&tz, month_start),
		this_year: midnight(&tz, year_start),
		last_7_days: midnight(&tz, back(6)),
		last_30_days: midnight(&tz, back(29)),
	}
}

/// One point per local day, oldest first, ending at `today`. Days without rows are zero.
pub fn daily_series<Tz: TimeZone>(
	tz: &Tz,
	points: &[LedgerPoint],
	category: Category,
	today: NaiveDate,
	days: u64,
) -> Vec<SeriesPoint> {
	let first = today.checked_sub_days(Days::new(days.saturating_sub(1))).unwrap_or(today);
	let mut per_day: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
	let mut day = first;
	while day <= today {
		per_day.insert(day, (0, 0));
		match day.succ_opt() {
			Some(next) => day = next,
			None => break,
		}
	}

	let counted = names(category.counted());
	let summed = names(category.summed());
	for p in points {
		let kind = p.transaction_type.as_str();
		if !counted.contains(&kind) {
			continue;
		}
		let date = p.created_at.with_timezone(tz).date_naive();
		if let Some((count, amount)) = per_day.get_mut(&date) {
			*count += 1;
			if summed.contains(&kind) {
				*amount += p.amount;
			}
		}
	}

	per_day
		.into_iter()
		.map(|(date, (count, amount))| SeriesPoint {
			period_label: date.format("%Y-%m-%d").to_string(),
			count,
			amount,
		})
		.collect()
}

fn category_stats(
	conn: &mut PgConnection,
	bounds: &BucketBounds,
	points: &[LedgerPoint],
	category: Category,
	now: &DateTime<Local>,
) -> Result<CategoryStats, AppError> {
	let (counts, amounts) =
		DashboardRepo::bucket_totals(conn, bounds, &names(category.counted()), &names(category.summed()))?;
	let tz = now.timezone();
	let today = now.date_naive();
	Ok(CategoryStats {
		counts,
		amounts,
		last_7_days_series: daily_series(&tz, points, category, today, 7),
		last_30_days_series: daily_series(&tz, points, category, today, 30),
	})
}

pub fn summary(conn: &mut PgConnection) -> Result<DashboardSummary, AppError> {
	let now = Local::now();
	let bounds = bucket_bounds(&now);

	// expired-but-pending rows must not be reported as pending
	let utc_now = now.with_timezone(&Utc);
	PendingTransactionRepo::expire_stale(conn, utc_now)?;
	StatusChangeRepo::expire_stale(conn, utc_now)?;

	let points = DashboardRepo::ledger_points_since(conn, bounds.last_30_days)?;
	log::debug!("Dashboard over {} ledger rows from the last 30 days", points.len());

	Ok(DashboardSummary {
		total: category_stats(conn, &bounds, &points, Category::Total, &now)?,
		topup: category_stats(conn, &bounds, &points, Category::Topup, &now)?,
		withdraw: category_stats(conn, &bounds, &points, Category::Withdraw, &now)?,
		transfer: category_stats(conn, &bounds, &points, Category::Transfer, &now)?,
		approvals: DashboardRepo::approval_rollup(conn, bounds.today)?,
		generated_at: utc_now,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::FixedOffset;

	fn point(at: DateTime<Utc>, kind: &str, amount: i64) -> LedgerPoint {
		LedgerPoint { created_at: at, transaction_type: kind.into(), amount }
	}

	#[test]
	fn test_week_is_anchored_on_monday() {
		// Thursday 2024-05-16 14:30 UTC
		let now = Utc.with_ymd_and_hms(2024, 5, 16, 14, 30, 0).unwrap();
		let b = bucket_bounds(&now);
		assert_eq!(b.today, Utc.with_ymd_and_hms(2024, 5, 16, 0, 0, 0).unwrap());
		assert_eq!(b.this_week, Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap());
		assert_eq!(b.this_month, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
		assert_eq!(b.this_year, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
		assert_eq!(b.last_7_days, Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap());
		assert_eq!(b.last_30_days, Utc.with_ymd_and_hms(2024, 4, 17, 0, 0, 0).unwrap());
	}

	#[test]
	fn test_monday_and_sunday_edges() {
		let monday = Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 1).unwrap();
		assert_eq!(bucket_bounds(&monday).this_week, Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap());
		let sunday = Utc.with_ymd_and_hms(2024, 5, 19, 23, 59, 59).unwrap();
		assert_eq!(bucket_bounds(&sunday).this_week, Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap());
	}

	#[test]
	fn test_bounds_follow_local_offset() {
		let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
		// 2024-05-13 01:00 in +07:00 is still Sunday in UTC
		let now = jakarta.with_ymd_and_hms(2024, 5, 13, 1, 0, 0).unwrap();
		let b = bucket_bounds(&now);
		assert_eq!(b.today, Utc.with_ymd_and_hms(2024, 5, 12, 17, 0, 0).unwrap());
		assert_eq!(b.this_week, b.today);
	}

	#[test]
	fn test_transfer_series_counts_both_legs_sums_outgoing() {
		let today = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
		let at = Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap();
		let points = vec![
			point(at, "transfer_out", 2_000),
			point(at, "transfer_in", 2_000),
			point(at, "topup", 500),
		];
		let series = daily_series(&Utc, &points, Category::Transfer, today, 7);
		assert_eq!(series.len(), 7);
		assert_eq!(series[0].period_label, "2024-05-10");
		assert_eq!(series[6].period_label, "2024-05-16");
		assert_eq!(series[5], SeriesPoint { period_label: "2024-05-15".into(), count: 2, amount: 2_000 });
		assert_eq!(series[6].count, 0);

		let total = daily_series(&Utc, &points, Category::Total, today, 7);
		assert_eq!(total[5].count, 3);
		assert_eq!(total[5].amount, 2_500);
	}

	#[test]
	fn test_total_counts_balance_set_without_summing_it() {
		let today = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
		let at = Utc.with_ymd_and_hms(2024, 5, 16, 8, 0, 0).unwrap();
		let points = vec![
			point(at, "topup", 1_000),
			point(at, "balance_adjustment", -200),
			point(at, "balance_set", 50_000),
		];
		let total = daily_series(&Utc, &points, Category::Total, today, 1);
		assert_eq!(total[0].count, 3);
		assert_eq!(total[0].amount, 800);
	}

	#[test]
	fn test_series_drops_rows_outside_window() {
		let today = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
		let old = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
		let series = daily_series(&Utc, &[point(old, "topup", 1)], Category::Topup, today, 30);
		assert_eq!(series.len(), 30);
		assert!(series.iter().all(|p| p.count == 0));
	}
}
