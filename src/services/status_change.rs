use super::{
	approval::validate_filter,
	audit::{AuditEntry, AuditTrail},
	decision::{precheck, rejection_reason, Decidable, Precheck},
};
use crate::{
	constants::{
		DEFAULT_PAGE_LIMIT, ENTITY_PENDING_STATUS_CHANGE, MAX_PAGE_LIMIT,
		STATUS_CHANGE_EXPIRE_HOURS,
	},
	error::AppError,
	models::{
		dto::{DecisionAction, StageStatusChangeRequest},
		Actor, AuditAction, NewPendingUserStatusChange, Page, PageRequest, PendingFilter,
		PendingStatus, PendingUserStatusChange, Priority, UserStatus,
	},
	repo::{StatusChangeRepo, UserRepo},
};
use chrono::{Duration, Utc};
use diesel::prelude::*;

/// A status change must name a valid code different from the current one.
pub fn check_transition(current: UserStatus, requested_code: i16) -> Result<UserStatus, AppError> {
	let requested = UserStatus::try_from(requested_code)?;
	if requested == current {
		return Err(AppError::ValidationFailed(format!("user is already {}", current.label())));
	}
	Ok(requested)
}

enum Decided {
	Expired { before: PendingUserStatusChange, after: PendingUserStatusChange },
	Approved { before: PendingUserStatusChange, after: PendingUserStatusChange },
	Rejected { before: PendingUserStatusChange, after: PendingUserStatusChange },
}

pub struct StatusChangeEngine;

impl StatusChangeEngine {
	pub fn stage(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		maker_admin_id: i64,
		user_id: i64,
		req: &StageStatusChangeRequest,
	) -> Result<PendingUserStatusChange, AppError> {
		let now = Utc::now();
		let pending = conn.transaction::<_, AppError, _>(|conn| {
			let user = UserRepo::find_active(conn, user_id)?;
			let requested = check_transition(user.status()?, req.requested_status)?;
			if StatusChangeRepo::has_open_request(conn, user_id, requested.code(), now)? {
				return Err(AppError::Conflict(format!(
					"a request to mark user {} {} is already pending",
					user_id,
					requested.label()
				)));
			}
			StatusChangeRepo::insert(
				conn,
				&NewPendingUserStatusChange {
					user_id,
					maker_admin_id,
					current_status: user.status,
					requested_status: requested.code(),
					reason: req.reason.trim(),
					status: PendingStatus::Pending.as_str(),
					priority: req.priority.unwrap_or(Priority::Normal).as_str(),
					expires_at: now + Duration::hours(STATUS_CHANGE_EXPIRE_HOURS),
					created_at: now,
					updated_at: now,
				},
			)
		})?;

		log::info!(
			"Admin {} staged status change #{} for user {}: {} -> {}",
			maker_admin_id,
			pending.id,
			user_id,
			pending.current_status,
			pending.requested_status
		);
		trail.record(
			conn,
			AuditEntry::new(
				Actor::Admin(maker_admin_id),
				AuditAction::Create,
				ENTITY_PENDING_STATUS_CHANGE,
				pending.id,
			)
			.new_values(&pending),
			201,
		);
		Ok(pending)
	}

	pub fn decide(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		change_id: i64,
		checker_admin_id: i64,
		action: DecisionAction,
		comments: Option<&str>,
		reason: Option<&str>,
	) -> Result<PendingUserStatusChange, AppError> {
		let now = Utc::now();
		let decided = conn.transaction::<_, AppError, _>(|conn| {
			let before = StatusChangeRepo::lock(conn, change_id)?;
			if precheck(&before, checker_admin_id, now)? == Precheck::Expire {
				let after = StatusChangeRepo::mark_expired(conn, change_id, now)?;
				return Ok(Decided::Expired { before, after });
			}

			match action {
				DecisionAction::Approve => {
					let user = UserRepo::lock_active(conn, before.user_id)?;
					let requested = check_transition(user.status()?, before.requested_status)?;
					UserRepo::set_status(conn, user.id, requested.code(), now)?;
					let after = StatusChangeRepo::mark_approved(
						conn,
						change_id,
						checker_admin_id,
						user.status,
						comments,
						now,
					)?;
					Ok(Decided::Approved { before, after })
				},
				DecisionAction::Reject => {
					let reason = rejection_reason(action, reason)?.unwrap_or_default();
					let after = StatusChangeRepo::mark_rejected(
						conn,
						change_id,
						checker_admin_id,
						&reason,
						comments,
						now,
					)?;
					Ok(Decided::Rejected { before, after })
				},
			}
		})?;

		let checker = Actor::Admin(checker_admin_id);
		match decided {
			Decided::Expired { before, after } => {
				log::info!("Status change #{} expired before a decision", change_id);
				trail.record(conn, transition(checker, AuditAction::Update, &before, &after), 400);
				Err(AppError::Expired)
			},
			Decided::Approved { before, after } => {
				log::info!(
					"Admin {} approved status change #{}: user {} now {}",
					checker_admin_id,
					change_id,
					after.user_id,
					after.requested_status
				);
				trail.record(conn, transition(checker, AuditAction::Approve, &before, &after), 200);
				Ok(after)
			},
			Decided::Rejected { before, after } => {
				log::info!("Admin {} rejected status change #{}", checker_admin_id, change_id);
				trail.record(conn, transition(checker, AuditAction::Reject, &before, &after), 200);
				Ok(after)
			},
		}
	}

	pub fn get(conn: &mut PgConnection, change_id: i64) -> Result<PendingUserStatusChange, AppError> {
		let now = Utc::now();
		let change = StatusChangeRepo::find(conn, change_id)?;
		if !change.is_overdue(now) {
			return Ok(change);
		}
		conn.transaction::<_, AppError, _>(|conn| {
			let locked = StatusChangeRepo::lock(conn, change_id)?;
			if locked.is_overdue(now) {
				StatusChangeRepo::mark_expired(conn, change_id, now)
			} else {
				Ok(locked)
			}
		})
	}

	pub fn list(
		conn: &mut PgConnection,
		filter: &PendingFilter,
	) -> Result<Page<PendingUserStatusChange>, AppError> {
		validate_filter(filter)?;
		let swept = StatusChangeRepo::expire_stale(conn, Utc::now())?;
		if swept > 0 {
			log::info!("Expired {} stale status changes before listing", swept);
		}
		let window =
			PageRequest { page: filter.page, limit: filter.limit }.window(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
		let (items, total) = StatusChangeRepo::page(conn, filter, window)?;
		Ok(window.wrap(items, total))
	}
}

fn transition(
	actor: Actor,
	action: AuditAction,
	before: &PendingUserStatusChange,
	after: &PendingUserStatusChange,
) -> AuditEntry {
	AuditEntry::new(actor, action, ENTITY_PENDING_STATUS_CHANGE, after.id)
		.old(before)
		.new_values(after)
}
