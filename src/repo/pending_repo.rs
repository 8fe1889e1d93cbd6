use crate::{
	error::AppError,
	models::{NewPendingTransaction, PageWindow, PendingFilter, PendingStatus, PendingTransaction},
	schema::pending_transactions,
};
use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};

const PENDING: &str = "pending";

pub struct PendingTransactionRepo;

impl PendingTransactionRepo {
	pub fn insert(
		conn: &mut PgConnection,
		pending: &NewPendingTransaction<'_>,
	) -> Result<PendingTransaction, AppError> {
		Ok(diesel::insert_into(pending_transactions::table)
			.values(pending)
			.returning(PendingTransaction::as_returning())
			.get_result(conn)?)
	}

	pub fn find(conn: &mut PgConnection, id: i64) -> Result<PendingTransaction, AppError> {
		pending_transactions::table
			.find(id)
			.select(PendingTransaction::as_select())
			.first(conn)
			.optional()?
			.ok_or(AppError::NotFound("Pending transaction"))
	}

	pub fn lock(conn: &mut PgConnection, id: i64) -> Result<PendingTransaction, AppError> {
		pending_transactions::table
			.find(id)
			.select(PendingTransaction::as_select())
			.for_update()
			.first(conn)
			.optional()?
			.ok_or(AppError::NotFound("Pending transaction"))
	}

	// Every transition below only matches rows still in `pending`, so a
	// terminal record can never be rewritten.

	pub fn mark_expired(
		conn: &mut PgConnection,
		id: i64,
		now: DateTime<Utc>,
	) -> Result<PendingTransaction, AppError> {
		Ok(diesel::update(
			pending_transactions::table
				.filter(pending_transactions::id.eq(id))
				.filter(pending_transactions::status.eq(PENDING)),
		)
		.set((
			pending_transactions::status.eq(PendingStatus::Expired.as_str()),
			pending_transactions::processed_at.eq(now),
			pending_transactions::updated_at.eq(now),
		))
		.returning(PendingTransaction::as_returning())
		.get_result(conn)?)
	}

	pub fn refresh_snapshot(
		conn: &mut PgConnection,
		id: i64,
		current_balance: i64,
		expected_balance: i64,
		now: DateTime<Utc>,
	) -> Result<PendingTransaction, AppError> {
		Ok(diesel::update(
			pending_transactions::table
				.filter(pending_transactions::id.eq(id))
				.filter(pending_transactions::status.eq(PENDING)),
		)
		.set((
			pending_transactions::current_balance.eq(current_balance),
			pending_transactions::expected_balance.eq(expected_balance),
			pending_transactions::updated_at.eq(now),
		))
		.returning(PendingTransaction::as_returning())
		.get_result(conn)?)
	}

	pub fn mark_approved(
		conn: &mut PgConnection,
		id: i64,
		checker_admin_id: i64,
		comments: Option<&str>,
		final_transaction_id: i64,
		now: DateTime<Utc>,
	) -> Result<PendingTransaction, AppError> {
		Ok(diesel::update(
			pending_transactions::table
				.filter(pending_transactions::id.eq(id))
				.filter(pending_transactions::status.eq(PENDING)),
		)
		.set((
			pending_transactions::status.eq(PendingStatus::Approved.as_str()),
			pending_transactions::checker_admin_id.eq(checker_admin_id),
			pending_transactions::approval_comments.eq(comments),
			pending_transactions::approved_at.eq(now),
			pending_transactions::processed_at.eq(now),
			pending_transactions::final_transaction_id.eq(final_transaction_id),
			pending_transactions::updated_at.eq(now),
		))
		.returning(PendingTransaction::as_returning())
		.get_result(conn)?)
	}

	pub fn mark_rejected(
		conn: &mut PgConnection,
		id: i64,
		checker_admin_id: i64,
		rejection_reason: &str,
		comments: Option<&str>,
		now: DateTime<Utc>,
	) -> Result<PendingTransaction, AppError> {
		Ok(diesel::update(
			pending_transactions::table
				.filter(pending_transactions::id.eq(id))
				.filter(pending_transactions::status.eq(PENDING)),
		)
		.set((
			pending_transactions::status.eq(PendingStatus::Rejected.as_str()),
			pending_transactions::checker_admin_id.eq(checker_admin_id),
			pending_transactions::rejection_reason.eq(rejection_reason),
			pending_transactions::approval_comments.eq(comments),
			pending_transactions::rejected_at.eq(now),
			pending_transactions::updated_at.eq(now),
		))
		.returning(PendingTransaction::as_returning())
		.get_result(conn)?)
	}

	/// Bulk `pending -> expired` for everything past its deadline.
	pub fn expire_stale(conn: &mut PgConnection, now: DateTime<Utc>) -> Result<usize, AppError> {
		Ok(diesel::update(
			pending_transactions::table
				.filter(pending_transactions::status.eq(PENDING))
				.filter(pending_transactions::expires_at.lt(now)),
		)
		.set((
			pending_transactions::status.eq(PendingStatus::Expired.as_str()),
			pending_transactions::processed_at.eq(now),
			pending_transactions::updated_at.eq(now),
		))
		.execute(conn)?)
	}

	pub fn page(
		conn: &mut PgConnection,
		filter: &PendingFilter,
		window: PageWindow,
	) -> Result<(Vec<PendingTransaction>, i64), AppError> {
		let total = Self::filtered(filter).count().get_result::<i64>(conn)?;
		let items = Self::filtered(filter)
			.order((pending_transactions::created_at.desc(), pending_transactions::id.desc()))
			.limit(window.limit)
			.offset(window.offset)
			.select(PendingTransaction::as_select())
			.load(conn)?;
		Ok((items, total))
	}

	fn filtered(filter: &PendingFilter) -> pending_transactions::BoxedQuery<'_, Pg> {
		let mut q = pending_transactions::table.into_boxed();
		if let Some(status) = filter.status.as_deref() {
			q = q.filter(pending_transactions::status.eq(status));
		}
		if let Some(kind) = filter.transaction_type.as_deref() {
			q = q.filter(pending_transactions::transaction_type.eq(kind));
		}
		if let Some(priority) = filter.priority.as_deref() {
			q = q.filter(pending_transactions::priority.eq(priority));
		}
		if let Some(user_id) = filter.user_id {
			q = q.filter(pending_transactions::user_id.eq(user_id));
		}
		if let Some(maker) = filter.maker_admin_id {
			q = q.filter(pending_transactions::maker_admin_id.eq(maker));
		}
		q
	}
}
