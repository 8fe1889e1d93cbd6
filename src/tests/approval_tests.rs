use crate::{
	error::AppError,
	models::{
		dto::{BalanceChangeOutcome, DecisionAction, StageStatusChangeRequest, ThresholdUpsertRequest},
		AdminRole, PendingFilter, Priority, TransactionType, UserStatus,
	},
	repo::{TransactionRepo, UserRepo},
	schema::{pending_transactions, pending_user_status_changes},
	services::{
		approval::ApprovalEngine, audit::AuditTrail, ledger::LedgerEngine,
		status_change::StatusChangeEngine, sweeper, threshold::ThresholdPolicy,
	},
	tests::{
		fixtures::TestFixtures,
		test_utils::{policy_guard, test_context, test_pool},
	},
};
use chrono::{Duration, Utc};
use diesel::prelude::*;

fn approve(
	conn: &mut PgConnection,
	trail: &AuditTrail,
	pending_id: i64,
	checker: i64,
) -> Result<crate::models::PendingTransaction, AppError> {
	ApprovalEngine::decide(conn, trail, pending_id, checker, DecisionAction::Approve, None, None)
}

fn move_deadline(conn: &mut PgConnection, pending_id: i64, by: Duration) {
	diesel::update(pending_transactions::table.find(pending_id))
		.set(pending_transactions::expires_at.eq(Utc::now() + by))
		.execute(conn)
		.unwrap();
}

#[test]
fn test_staged_topup_is_approved_by_second_admin() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Topup, 1_000_000, 24);
	let user = TestFixtures::funded_user(&mut conn, &trail, 1_500);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let checker = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let pending = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 5_000_000),
	)
	.unwrap();
	assert_eq!(pending.status, "pending");
	assert_eq!(pending.current_balance, 1_500);
	assert_eq!(pending.expected_balance, 5_001_500);
	assert_eq!(pending.approval_threshold, 1_000_000);
	let hours = (pending.expires_at - pending.created_at).num_hours();
	assert_eq!(hours, 24);

	let approved = approve(&mut conn, &trail, pending.id, checker.id).unwrap();
	assert_eq!(approved.status, "approved");
	assert_eq!(approved.checker_admin_id, Some(checker.id));
	assert_ne!(approved.checker_admin_id, Some(approved.maker_admin_id));
	assert!(approved.approved_at.is_some() && approved.processed_at.is_some());

	let txn = TransactionRepo::find(&mut conn, approved.final_transaction_id.unwrap()).unwrap();
	assert_eq!((txn.user_id, txn.transaction_type.as_str(), txn.amount), (user.id, "topup", 5_000_000));
	assert_eq!(UserRepo::find_active(&mut conn, user.id).unwrap().balance, 5_001_500);
}

#[test]
fn test_stale_withdraw_stays_pending_with_refreshed_snapshot() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Withdraw, 5_000, 24);
	let user = TestFixtures::funded_user(&mut conn, &trail, 10_000);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let checker = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let pending = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Withdraw, 8_000),
	)
	.unwrap();
	assert_eq!(pending.expected_balance, 2_000);

	LedgerEngine::withdraw(&mut conn, &trail, user.id, 5_000, None).unwrap();
	let err = approve(&mut conn, &trail, pending.id, checker.id).unwrap_err();
	assert!(matches!(err, AppError::InsufficientFunds));

	let after = ApprovalEngine::get(&mut conn, pending.id).unwrap();
	assert_eq!(after.status, "pending");
	assert_eq!(after.current_balance, 5_000);
	assert_eq!(after.expected_balance, -3_000);
	assert!(after.final_transaction_id.is_none());
	assert_eq!(UserRepo::find_active(&mut conn, user.id).unwrap().balance, 5_000);

	let rejected = ApprovalEngine::decide(
		&mut conn,
		&trail,
		pending.id,
		checker.id,
		DecisionAction::Reject,
		None,
		Some("balance no longer covers it"),
	)
	.unwrap();
	assert_eq!(rejected.status, "rejected");
	assert_eq!(rejected.rejection_reason.as_deref(), Some("balance no longer covers it"));
}

#[test]
fn test_moved_balance_that_still_fits_is_applied() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Withdraw, 5_000, 24);
	let user = TestFixtures::funded_user(&mut conn, &trail, 10_000);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let checker = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let pending = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Withdraw, 6_000),
	)
	.unwrap();
	LedgerEngine::topup(&mut conn, &trail, user.id, 1_000, None).unwrap();

	let approved = approve(&mut conn, &trail, pending.id, checker.id).unwrap();
	assert_eq!(approved.status, "approved");
	assert_eq!(approved.current_balance, 11_000);
	assert_eq!(approved.expected_balance, 5_000);
	assert_eq!(UserRepo::find_active(&mut conn, user.id).unwrap().balance, 5_000);
}

#[test]
fn test_maker_cannot_approve_own_request() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Topup, 1_000, 24);
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Super);

	let pending = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 2_000),
	)
	.unwrap();
	let err = approve(&mut conn, &trail, pending.id, maker.id).unwrap_err();
	assert!(matches!(err, AppError::SegregationViolation));
	assert_eq!(err.kind(), "Forbidden");
	assert_eq!(ApprovalEngine::get(&mut conn, pending.id).unwrap().status, "pending");
	assert_eq!(UserRepo::find_active(&mut conn, user.id).unwrap().balance, 0);
}

#[test]
fn test_overdue_request_expires_on_decide() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Topup, 1_000, 24);
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let checker = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let soon = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 1_000),
	)
	.unwrap();
	let late = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 3_000),
	)
	.unwrap();
	move_deadline(&mut conn, soon.id, Duration::seconds(30));
	move_deadline(&mut conn, late.id, Duration::seconds(-1));

	assert_eq!(approve(&mut conn, &trail, soon.id, checker.id).unwrap().status, "approved");

	let err = approve(&mut conn, &trail, late.id, checker.id).unwrap_err();
	assert!(matches!(err, AppError::Expired));
	let expired = ApprovalEngine::get(&mut conn, late.id).unwrap();
	assert_eq!(expired.status, "expired");
	assert!(expired.processed_at.is_some());
	assert!(expired.final_transaction_id.is_none());
	assert_eq!(UserRepo::find_active(&mut conn, user.id).unwrap().balance, 1_000);

	// terminal now, so a second attempt is AlreadyDecided
	assert!(matches!(
		approve(&mut conn, &trail, late.id, checker.id),
		Err(AppError::AlreadyDecided(s)) if s == "expired"
	));
}

#[test]
fn test_staging_at_and_below_threshold() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::BalanceAdjustment, 50_000, 12);
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let at = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::BalanceAdjustment, 50_000),
	)
	.unwrap();
	assert_eq!(at.status, "pending");
	assert_eq!((at.expires_at - at.created_at).num_hours(), 12);

	let below = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::BalanceAdjustment, 49_999),
	)
	.unwrap_err();
	assert!(matches!(below, AppError::BelowThreshold { amount: 49_999, threshold: 50_000 }));
}

#[test]
fn test_staging_without_policy_fails() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::without_threshold(&mut conn, TransactionType::BalanceSet);
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let err = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::BalanceSet, 10),
	)
	.unwrap_err();
	assert!(matches!(err, AppError::NoPolicy(kind) if kind == "balance_set"));
}

#[test]
fn test_submit_routes_by_threshold() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Topup, 10_000, 24);
	let user = TestFixtures::user(&mut conn);
	let admin = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let small = ApprovalEngine::submit(
		&mut conn,
		&trail,
		admin.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 9_999),
	)
	.unwrap();
	match small {
		BalanceChangeOutcome::Executed(txn) => {
			assert_eq!(txn.balance_after, 9_999);
			assert_eq!(txn.description, "Admin topup");
		},
		other => panic!("expected direct execution, got {:?}", other),
	}

	let large = ApprovalEngine::submit(
		&mut conn,
		&trail,
		admin.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 10_000),
	)
	.unwrap();
	assert!(matches!(large, BalanceChangeOutcome::Staged(p) if p.expected_balance == 19_999));
	assert_eq!(UserRepo::find_active(&mut conn, user.id).unwrap().balance, 9_999);
}

#[test]
fn test_dual_approval_amount_defaults_to_critical() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	let owner = TestFixtures::admin(&mut conn, AdminRole::Super);
	ThresholdPolicy::upsert(
		&mut conn,
		&trail,
		owner.id,
		&ThresholdUpsertRequest {
			transaction_type: TransactionType::Topup,
			amount_threshold: 1_000,
			requires_dual_approval: true,
			dual_approval_threshold: Some(100_000),
			auto_expire_hours: 24,
		},
	)
	.unwrap();
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let stage = |conn: &mut PgConnection, amount: i64, priority: Option<Priority>| {
		let mut change = TestFixtures::change(TransactionType::Topup, amount);
		change.priority = priority;
		ApprovalEngine::stage(conn, &trail, maker.id, user.id, &change).unwrap()
	};
	assert_eq!(stage(&mut conn, 100_000, None).priority, "critical");
	assert_eq!(stage(&mut conn, 99_999, None).priority, "normal");
	assert_eq!(stage(&mut conn, 100_000, Some(Priority::Low)).priority, "low");
}

#[test]
fn test_invalid_dual_policy_is_refused() {
	let Some(pool) = test_pool() else { return };
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	let owner = TestFixtures::admin(&mut conn, AdminRole::Super);
	let err = ThresholdPolicy::upsert(
		&mut conn,
		&trail,
		owner.id,
		&ThresholdUpsertRequest {
			transaction_type: TransactionType::Withdraw,
			amount_threshold: 10_000,
			requires_dual_approval: true,
			dual_approval_threshold: Some(10_000),
			auto_expire_hours: 24,
		},
	)
	.unwrap_err();
	assert!(matches!(err, AppError::ValidationFailed(_)));
}

#[test]
fn test_rejection_needs_reason() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Topup, 1_000, 24);
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let checker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let pending = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 1_000),
	)
	.unwrap();

	let err = ApprovalEngine::decide(
		&mut conn,
		&trail,
		pending.id,
		checker.id,
		DecisionAction::Reject,
		Some("no"),
		Some("   "),
	)
	.unwrap_err();
	assert!(matches!(err, AppError::MissingReason));
	assert_eq!(ApprovalEngine::get(&mut conn, pending.id).unwrap().status, "pending");
}

#[test]
fn test_list_expires_stale_rows_first() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Topup, 1_000, 24);
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let pending = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 1_000),
	)
	.unwrap();
	move_deadline(&mut conn, pending.id, Duration::minutes(-5));

	let page = ApprovalEngine::list(
		&mut conn,
		&PendingFilter { user_id: Some(user.id), ..Default::default() },
	)
	.unwrap();
	assert_eq!(page.total, 1);
	assert_eq!(page.items[0].status, "expired");

	let pending_only = ApprovalEngine::list(
		&mut conn,
		&PendingFilter {
			user_id: Some(user.id),
			status: Some("pending".to_string()),
			..Default::default()
		},
	)
	.unwrap();
	assert_eq!(pending_only.total, 0);

	assert!(matches!(
		ApprovalEngine::list(
			&mut conn,
			&PendingFilter { status: Some("bogus".to_string()), ..Default::default() }
		),
		Err(AppError::ValidationFailed(_))
	));
}

#[test]
fn test_sweeper_expires_both_queues() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	TestFixtures::threshold(&mut conn, &trail, TransactionType::Topup, 1_000, 24);
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);

	let pending = ApprovalEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&TestFixtures::change(TransactionType::Topup, 1_000),
	)
	.unwrap();
	let change = StatusChangeEngine::stage(
		&mut conn,
		&trail,
		maker.id,
		user.id,
		&StageStatusChangeRequest {
			requested_status: UserStatus::Blocked.code(),
			reason: "fraud review".to_string(),
			priority: None,
		},
	)
	.unwrap();
	move_deadline(&mut conn, pending.id, Duration::hours(-1));
	diesel::update(pending_user_status_changes::table.find(change.id))
		.set(pending_user_status_changes::expires_at.eq(Utc::now() - Duration::hours(1)))
		.execute(&mut conn)
		.unwrap();

	let report = sweeper::sweep(&mut conn, Utc::now()).unwrap();
	assert!(report.balance_changes >= 1);
	assert!(report.status_changes >= 1);
	let swept = ApprovalEngine::get(&mut conn, pending.id).unwrap();
	assert_eq!(swept.status, "expired");
	assert!(swept.processed_at.is_some());
	let swept = StatusChangeEngine::get(&mut conn, change.id).unwrap();
	assert_eq!(swept.status, "expired");
	assert!(swept.processed_at.is_some());
}

#[test]
fn test_status_change_flow() {
	let Some(pool) = test_pool() else { return };
	let mut conn = pool.get().unwrap();
	let trail = AuditTrail::new(test_context());
	let user = TestFixtures::user(&mut conn);
	let maker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let checker = TestFixtures::admin(&mut conn, AdminRole::Admin);
	let block = StageStatusChangeRequest {
		requested_status: UserStatus::Blocked.code(),
		reason: "chargeback fraud".to_string(),
		priority: Some(Priority::High),
	};

	let change = StatusChangeEngine::stage(&mut conn, &trail, maker.id, user.id, &block).unwrap();
	assert_eq!((change.current_status, change.requested_status), (1, 2));
	assert_eq!((change.expires_at - change.created_at).num_hours(), 24);
	assert!(matches!(
		StatusChangeEngine::stage(&mut conn, &trail, maker.id, user.id, &block),
		Err(AppError::Conflict(_))
	));
	assert!(matches!(
		StatusChangeEngine::decide(
			&mut conn,
			&trail,
			change.id,
			maker.id,
			DecisionAction::Approve,
			None,
			None
		),
		Err(AppError::SegregationViolation)
	));

	let approved = StatusChangeEngine::decide(
		&mut conn,
		&trail,
		change.id,
		checker.id,
		DecisionAction::Approve,
		Some("confirmed"),
		None,
	)
	.unwrap();
	assert_eq!(approved.status, "approved");
	let blocked = UserRepo::find_active(&mut conn, user.id).unwrap();
	assert_eq!(blocked.status().unwrap(), UserStatus::Blocked);
	// the approved block stops money movement at once
	assert!(matches!(
		LedgerEngine::topup(&mut conn, &trail, user.id, 500, None),
		Err(AppError::Forbidden(_))
	));

	assert!(matches!(
		StatusChangeEngine::decide(
			&mut conn,
			&trail,
			change.id,
			checker.id,
			DecisionAction::Approve,
			None,
			None
		),
		Err(AppError::AlreadyDecided(_))
	));
	assert!(matches!(
		StatusChangeEngine::stage(&mut conn, &trail, maker.id, user.id, &block),
		Err(AppError::ValidationFailed(_))
	));
}
