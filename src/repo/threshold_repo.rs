use crate::{
	error::AppError,
	models::{ApprovalThreshold, ThresholdValues},
	schema::approval_thresholds,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub struct ThresholdRepo;

impl ThresholdRepo {
	pub fn find_by_type(
		conn: &mut PgConnection,
		transaction_type: &str,
	) -> Result<Option<ApprovalThreshold>, AppError> {
		Ok(approval_thresholds::table
			.filter(approval_thresholds::transaction_type.eq(transaction_type))
			.select(ApprovalThreshold::as_select())
			.first(conn)
			.optional()?)
	}

	pub fn find_active_by_type(
		conn: &mut PgConnection,
		transaction_type: &str,
	) -> Result<Option<ApprovalThreshold>, AppError> {
		Ok(approval_thresholds::table
			.filter(approval_thresholds::transaction_type.eq(transaction_type))
			.filter(approval_thresholds::is_active.eq(true))
			.select(ApprovalThreshold::as_select())
			.first(conn)
			.optional()?)
	}

	pub fn lock(conn: &mut PgConnection, id: i64) -> Result<ApprovalThreshold, AppError> {
		approval_thresholds::table
			.find(id)
			.select(ApprovalThreshold::as_select())
			.for_update()
			.first(conn)
			.optional()?
			.ok_or(AppError::NotFound("Approval threshold"))
	}

	pub fn list(
		conn: &mut PgConnection,
		active_only: bool,
	) -> Result<Vec<ApprovalThreshold>, AppError> {
		let mut query = approval_thresholds::table.into_boxed();
		if active_only {
			query = query.filter(approval_thresholds::is_active.eq(true));
		}
		Ok(query
			.order(approval_thresholds::transaction_type.asc())
			.select(ApprovalThreshold::as_select())
			.load(conn)?)
	}

	pub fn upsert(
		conn: &mut PgConnection,
		values: &ThresholdValues<'_>,
	) -> Result<ApprovalThreshold, AppError> {
		Ok(diesel::insert_into(approval_thresholds::table)
			.values(values)
			.on_conflict(approval_thresholds::transaction_type)
			.do_update()
			.set(values)
			.returning(ApprovalThreshold::as_returning())
			.get_result(conn)?)
	}

	pub fn deactivate(
		conn: &mut PgConnection,
		id: i64,
		now: DateTime<Utc>,
	) -> Result<ApprovalThreshold, AppError> {
		Ok(diesel::update(approval_thresholds::table.find(id))
			.set((approval_thresholds::is_active.eq(false), approval_thresholds::updated_at.eq(now)))
			.returning(ApprovalThreshold::as_returning())
			.get_result(conn)?)
	}
}
