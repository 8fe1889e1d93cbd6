use super::{
	audit::{AuditEntry, AuditTrail},
	decision::{precheck, rejection_reason, Decidable, Precheck},
	ledger::{projected_balance, ApplyOutcome, LedgerEngine},
};
use crate::{
	constants::{DEFAULT_PAGE_LIMIT, ENTITY_PENDING_TRANSACTION, MAX_PAGE_LIMIT},
	error::AppError,
	models::{
		dto::{BalanceChangeOutcome, BalanceChangeRequest, DecisionAction},
		Actor, ApprovalThreshold, AuditAction, NewPendingTransaction, Page, PageRequest,
		PendingFilter, PendingStatus, PendingTransaction, Priority, Transaction, TransactionType,
	},
	repo::{PendingTransactionRepo, ThresholdRepo, UserRepo},
};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;

/// Explicit priority wins; otherwise reaching the dual-approval amount makes it critical.
pub fn default_priority(
	requested: Option<Priority>,
	threshold: &ApprovalThreshold,
	amount: i64,
) -> Priority {
	if let Some(p) = requested {
		return p;
	}
	match threshold.dual_approval_threshold {
		Some(dual) if threshold.requires_dual_approval && amount >= dual => Priority::Critical,
		_ => Priority::Normal,
	}
}

pub fn expires_at(threshold: &ApprovalThreshold, now: DateTime<Utc>) -> DateTime<Utc> {
	now + Duration::hours(i64::from(threshold.auto_expire_hours))
}

enum Decided {
	Expired { before: PendingTransaction, after: PendingTransaction },
	Stale { before: PendingTransaction, after: PendingTransaction },
	Approved { before: PendingTransaction, after: PendingTransaction, txn: Transaction },
	Rejected { before: PendingTransaction, after: PendingTransaction },
}

pub struct ApprovalEngine;

impl ApprovalEngine {
	/// Stages a change that must wait for a checker. Fails `BelowThreshold` under the policy amount.
	pub fn stage(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		maker_admin_id: i64,
		user_id: i64,
		change: &BalanceChangeRequest,
	) -> Result<PendingTransaction, AppError> {
		let kind = admin_kind(change.transaction_type)?;
		let threshold = ThresholdRepo::find_active_by_type(conn, kind.as_str())?
			.ok_or_else(|| AppError::NoPolicy(kind.to_string()))?;
		Self::stage_under(conn, trail, maker_admin_id, user_id, change, &threshold)
	}

	/// Admin balance submission: staged when the policy demands it, otherwise executed directly.
	pub fn submit(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		admin_id: i64,
		user_id: i64,
		change: &BalanceChangeRequest,
	) -> Result<BalanceChangeOutcome, AppError> {
		let kind = admin_kind(change.transaction_type)?;
		match ThresholdRepo::find_active_by_type(conn, kind.as_str())? {
			Some(threshold) if change.amount >= threshold.amount_threshold =>
				Self::stage_under(conn, trail, admin_id, user_id, change, &threshold)
					.map(BalanceChangeOutcome::Staged),
			_ => {
				let description = change
					.description
					.clone()
					.unwrap_or_else(|| format!("Admin {}", kind));
				LedgerEngine::apply_direct_change(
					conn,
					trail,
					admin_id,
					user_id,
					kind,
					change.amount,
					&description,
				)
				.map(BalanceChangeOutcome::Executed)
			},
		}
	}

	fn stage_under(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		maker_admin_id: i64,
		user_id: i64,
		change: &BalanceChangeRequest,
		threshold: &ApprovalThreshold,
	) -> Result<PendingTransaction, AppError> {
		let kind = change.transaction_type;
		if change.amount < 1 {
			return Err(AppError::InvalidAmount);
		}
		if change.amount < threshold.amount_threshold {
			return Err(AppError::BelowThreshold {
				amount: change.amount,
				threshold: threshold.amount_threshold,
			});
		}

		let user = UserRepo::find_active(conn, user_id)?;
		let expected = projected_balance(kind, user.balance, change.amount)
			.ok_or_else(|| AppError::ValidationFailed("balance would overflow".to_string()))?;
		if expected < 0 {
			return Err(AppError::InsufficientFunds);
		}

		let now = Utc::now();
		let priority = default_priority(change.priority, threshold, change.amount);
		let pending = PendingTransactionRepo::insert(
			conn,
			&NewPendingTransaction {
				user_id,
				maker_admin_id,
				transaction_type: kind.as_str(),
				amount: change.amount,
				current_balance: user.balance,
				expected_balance: expected,
				description: change.description.as_deref().unwrap_or_default(),
				reason: change.reason.as_deref().unwrap_or_default(),
				status: PendingStatus::Pending.as_str(),
				priority: priority.as_str(),
				approval_threshold: threshold.amount_threshold,
				request_data: change.request_data.clone(),
				expires_at: expires_at(threshold, now),
				created_at: now,
				updated_at: now,
			},
		)?;

		log::info!(
			"Admin {} staged {} {} for user {} as pending #{} ({})",
			maker_admin_id,
			kind,
			change.amount,
			user_id,
			pending.id,
			pending.priority
		);
		trail.record(
			conn,
			AuditEntry::new(
				Actor::Admin(maker_admin_id),
				AuditAction::Create,
				ENTITY_PENDING_TRANSACTION,
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
		pending_id: i64,
		checker_admin_id: i64,
		action: DecisionAction,
		comments: Option<&str>,
		reason: Option<&str>,
	) -> Result<PendingTransaction, AppError> {
		let now = Utc::now();
		let decided = conn.transaction::<_, AppError, _>(|conn| {
			let before = PendingTransactionRepo::lock(conn, pending_id)?;
			if precheck(&before, checker_admin_id, now)? == Precheck::Expire {
				let after = PendingTransactionRepo::mark_expired(conn, pending_id, now)?;
				return Ok(Decided::Expired { before, after });
			}

			match action {
				DecisionAction::Approve => match LedgerEngine::apply_approved_change(conn, &before)? {
					ApplyOutcome::Applied(txn) => {
						let after = PendingTransactionRepo::mark_approved(
							conn,
							pending_id,
							checker_admin_id,
							comments,
							txn.id,
							now,
						)?;
						Ok(Decided::Approved { before, after, txn })
					},
					ApplyOutcome::Stale(after) => Ok(Decided::Stale { before, after }),
				},
				DecisionAction::Reject => {
					let reason = rejection_reason(action, reason)?.unwrap_or_default();
					let after = PendingTransactionRepo::mark_rejected(
						conn,
						pending_id,
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
				log::info!("Pending #{} expired at {} before a decision", pending_id, after.expires_at);
				trail.record(conn, transition(checker, AuditAction::Update, &before, &after), 400);
				Err(AppError::Expired)
			},
			Decided::Stale { before, after } => {
				log::warn!(
					"Pending #{} no longer fits balance {} (expected {}), left pending",
					pending_id,
					after.current_balance,
					after.expected_balance
				);
				trail.record(conn, transition(checker, AuditAction::Update, &before, &after), 400);
				Err(AppError::InsufficientFunds)
			},
			Decided::Approved { before, after, txn } => {
				log::info!(
					"Admin {} approved pending #{} -> transaction #{}",
					checker_admin_id,
					pending_id,
					txn.id
				);
				trail.record(conn, transition(checker, AuditAction::Approve, &before, &after), 200);
				Ok(after)
			},
			Decided::Rejected { before, after } => {
				log::info!("Admin {} rejected pending #{}", checker_admin_id, pending_id);
				trail.record(conn, transition(checker, AuditAction::Reject, &before, &after), 200);
				Ok(after)
			},
		}
	}

	/// Reads one record, moving it to `expired` first if its deadline has passed.
	pub fn get(conn: &mut PgConnection, pending_id: i64) -> Result<PendingTransaction, AppError> {
		let now = Utc::now();
		let pending = PendingTransactionRepo::find(conn, pending_id)?;
		if !pending.is_overdue(now) {
			return Ok(pending);
		}
		conn.transaction::<_, AppError, _>(|conn| {
			let locked = PendingTransactionRepo::lock(conn, pending_id)?;
			if locked.is_overdue(now) {
				log::info!("Pending #{} expired on read", pending_id);
				PendingTransactionRepo::mark_expired(conn, pending_id, now)
			} else {
				Ok(locked)
			}
		})
	}

	pub fn list(
		conn: &mut PgConnection,
		filter: &PendingFilter,
	) -> Result<Page<PendingTransaction>, AppError> {
		validate_filter(filter)?;
		let swept = PendingTransactionRepo::expire_stale(conn, Utc::now())?;
		if swept > 0 {
			log::info!("Expired {} stale pending transactions before listing", swept);
		}
		let window =
			PageRequest { page: filter.page, limit: filter.limit }.window(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
		let (items, total) = PendingTransactionRepo::page(conn, filter, window)?;
		Ok(window.wrap(items, total))
	}
}

fn admin_kind(kind: TransactionType) -> Result<TransactionType, AppError> {
	if kind.is_admin_change() {
		Ok(kind)
	} else {
		Err(AppError::ValidationFailed(format!("{} is not an admin balance change", kind)))
	}
}

pub(crate) fn validate_filter(filter: &PendingFilter) -> Result<(), AppError> {
	if let Some(status) = filter.status.as_deref() {
		status.parse::<PendingStatus>()?;
	}
	if let Some(priority) = filter.priority.as_deref() {
		priority.parse::<Priority>()?;
	}
	if let Some(kind) = filter.transaction_type.as_deref() {
		kind.parse::<TransactionType>()?;
	}
	Ok(())
}

fn transition(
	actor: Actor,
	action: AuditAction,
	before: &PendingTransaction,
	after: &PendingTransaction,
) -> AuditEntry {
	AuditEntry::new(actor, action, ENTITY_PENDING_TRANSACTION, after.id).old(before).new_values(after)
}
