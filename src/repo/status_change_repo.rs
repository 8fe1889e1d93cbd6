use crate::{
	error::AppError,
	models::{
		NewPendingUserStatusChange, PageWindow, PendingFilter, PendingStatus,
		PendingUserStatusChange,
	},
	schema::pending_user_status_changes as changes,
};
use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};

const PENDING: &str = "pending";

pub struct StatusChangeRepo;

impl StatusChangeRepo {
	pub fn insert(
		conn: &mut PgConnection,
		change: &NewPendingUserStatusChange<'_>,
	) -> Result<PendingUserStatusChange, AppError> {
		Ok(diesel::insert_into(changes::table)
			.values(change)
			.returning(PendingUserStatusChange::as_returning())
			.get_result(conn)?)
	}

	pub fn find(conn: &mut PgConnection, id: i64) -> Result<PendingUserStatusChange, AppError> {
		changes::table
			.find(id)
			.select(PendingUserStatusChange::as_select())
			.first(conn)
			.optional()?
			.ok_or(AppError::NotFound("Pending status change"))
	}

	pub fn lock(conn: &mut PgConnection, id: i64) -> Result<PendingUserStatusChange, AppError> {
		changes::table
			.find(id)
			.select(PendingUserStatusChange::as_select())
			.for_update()
			.first(conn)
			.optional()?
			.ok_or(AppError::NotFound("Pending status change"))
	}

	/// Whether the user already has an open request for the same target status.
	pub fn has_open_request(
		conn: &mut PgConnection,
		user_id: i64,
		requested_status: i16,
		now: DateTime<Utc>,
	) -> Result<bool, AppError> {
		let open = changes::table
			.filter(changes::user_id.eq(user_id))
			.filter(changes::requested_status.eq(requested_status))
			.filter(changes::status.eq(PENDING))
			.filter(changes::expires_at.ge(now))
			.count()
			.get_result::<i64>(conn)?;
		Ok(open > 0)
	}

	pub fn mark_expired(
		conn: &mut PgConnection,
		id: i64,
		now: DateTime<Utc>,
	) -> Result<PendingUserStatusChange, AppError> {
		Ok(diesel::update(changes::table.filter(changes::id.eq(id)).filter(changes::status.eq(PENDING)))
			.set((
				changes::status.eq(PendingStatus::Expired.as_str()),
				changes::processed_at.eq(now),
				changes::updated_at.eq(now),
			))
			.returning(PendingUserStatusChange::as_returning())
			.get_result(conn)?)
	}

	pub fn mark_approved(
		conn: &mut PgConnection,
		id: i64,
		checker_admin_id: i64,
		current_status: i16,
		comments: Option<&str>,
		now: DateTime<Utc>,
	) -> Result<PendingUserStatusChange, AppError> {
		Ok(diesel::update(changes::table.filter(changes::id.eq(id)).filter(changes::status.eq(PENDING)))
			.set((
				changes::status.eq(PendingStatus::Approved.as_str()),
				changes::checker_admin_id.eq(checker_admin_id),
				changes::current_status.eq(current_status),
				changes::approval_comments.eq(comments),
				changes::approved_at.eq(now),
				changes::processed_at.eq(now),
				changes::updated_at.eq(now),
			))
			.returning(PendingUserStatusChange::as_returning())
			.get_result(conn)?)
	}

	pub fn mark_rejected(
		conn: &mut PgConnection,
		id: i64,
		checker_admin_id: i64,
		rejection_reason: &str,
		comments: Option<&str>,
		now: DateTime<Utc>,
	) -> Result<PendingUserStatusChange, AppError> {
		Ok(diesel::update(changes::table.filter(changes::id.eq(id)).filter(changes::status.eq(PENDING)))
			.set((
				changes::status.eq(PendingStatus::Rejected.as_str()),
				changes::checker_admin_id.eq(checker_admin_id),
				changes::rejection_reason.eq(rejection_reason),
				changes::approval_comments.eq(comments),
				changes::rejected_at.eq(now),
				changes::updated_at.eq(now),
			))
			.returning(PendingUserStatusChange::as_returning())
			.get_result(conn)?)
	}

	pub fn expire_stale(conn: &mut PgConnection, now: DateTime<Utc>) -> Result<usize, AppError> {
		Ok(diesel::update(
			changes::table.filter(changes::status.eq(PENDING)).filter(changes::expires_at.lt(now)),
		)
		.set((
			changes::status.eq(PendingStatus::Expired.as_str()),
			changes::processed_at.eq(now),
			changes::updated_at.eq(now),
		))
		.execute(conn)?)
	}

	pub fn page(
		conn: &mut PgConnection,
		filter: &PendingFilter,
		window: PageWindow,
	) -> Result<(Vec<PendingUserStatusChange>, i64), AppError> {
		let total = Self::filtered(filter).count().get_result::<i64>(conn)?;
		let items = Self::filtered(filter)
			.order((changes::created_at.desc(), changes::id.desc()))
			.limit(window.limit)
			.offset(window.offset)
			.select(PendingUserStatusChange::as_select())
			.load(conn)?;
		Ok((items, total))
	}

	fn filtered(filter: &PendingFilter) -> changes::BoxedQuery<'_, Pg> {
		let mut q = changes::table.into_boxed();
		if let Some(status) = filter.status.as_deref() {
			q = q.filter(changes::status.eq(status));
		}
		if let Some(priority) = filter.priority.as_deref() {
			q = q.filter(changes::priority.eq(priority));
		}
		if let Some(user_id) = filter.user_id {
			q = q.filter(changes::user_id.eq(user_id));
		}
		if let Some(maker) = filter.maker_admin_id {
			q = q.filter(changes::maker_admin_id.eq(maker));
		}
		q
	}
}
