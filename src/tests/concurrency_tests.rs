use crate::{
	error::AppError,
	models::{dto::DecisionAction, AdminRole, TransactionType},
	repo::{TransactionRepo, UserRepo},
	services::{approval::ApprovalEngine, audit::AuditTrail, ledger::LedgerEngine},
	tests::{
		fixtures::TestFixtures,
		test_utils::{policy_guard, test_context, test_pool},
	},
};
use std::{sync::Barrier, thread};

#[test]
fn test_parallel_withdrawals_never_overdraw() {
	let Some(pool) = test_pool() else { return };
	let user = {
		let mut conn = pool.get().unwrap();
		let trail = AuditTrail::new(test_context());
		TestFixtures::funded_user(&mut conn, &trail, 1_000)
	};
	let attempts = 8;
	let amount = 300;
	let barrier = Barrier::new(attempts);

	let results: Vec<Result<_, AppError>> = thread::scope(|s| {
		let handles: Vec<_> = (0..attempts)
			.map(|_| {
				let barrier = &barrier;
				let pool = &pool;
				let user_id = user.id;
				s.spawn(move || {
					let mut conn = pool.get().unwrap();
					let trail = AuditTrail::new(test_context());
					barrier.wait();
					LedgerEngine::withdraw(&mut conn, &trail, user_id, amount, None)
				})
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});

	let ok = results.iter().filter(|r| r.is_ok()).count();
	assert_eq!(ok, (1_000 / amount) as usize);
	assert!(results
		.iter()
		.filter_map(|r| r.as_ref().err())
		.all(|e| matches!(e, AppError::InsufficientFunds)));

	let mut conn = pool.get().unwrap();
	assert_eq!(UserRepo::find_active(&mut conn, user.id).unwrap().balance, 100);
	let timeline = TransactionRepo::timeline(&mut conn, user.id).unwrap();
	for pair in timeline.windows(2) {
		assert_eq!(pair[1].balance_before, pair[0].balance_after);
	}
}

#[test]
fn test_racing_approvals_decide_once() {
	let Some(pool) = test_pool() else { return };
	let _policy = policy_guard();
	let (user, pending, checkers) = {
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
			&TestFixtures::change(TransactionType::Topup, 2_500),
		)
		.unwrap();
		let checkers = [
			TestFixtures::admin(&mut conn, AdminRole::Admin).id,
			TestFixtures::admin(&mut conn, AdminRole::Admin).id,
		];
		(user, pending, checkers)
	};
	let pending_id = pending.id;
	let barrier = Barrier::new(checkers.len());

	let results: Vec<_> = thread::scope(|s| {
		let handles: Vec<_> = checkers
			.iter()
			.map(|&checker| {
				let barrier = &barrier;
				let pool = &pool;
				s.spawn(move || {
					let mut conn = pool.get().unwrap();
					let trail = AuditTrail::new(test_context());
					barrier.wait();
					ApprovalEngine::decide(
						&mut conn,
						&trail,
						pending_id,
						checker,
						DecisionAction::Approve,
						None,
						None,
					)
				})
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});

	assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
	assert!(results
		.iter()
		.any(|r| matches!(r, Err(AppError::AlreadyDecided(s)) if s == "approved")));
	let mut conn = pool.get().unwrap();
	assert_eq!(UserRepo::find_active(&mut conn, user.id).unwrap().balance, 2_500);
	assert_eq!(TransactionRepo::timeline(&mut conn, user.id).unwrap().len(), 1);
}

#[test]
fn test_crossing_transfers_do_not_deadlock() {
	let Some(pool) = test_pool() else { return };
	let (a, b, a_account, b_account) = {
		let mut conn = pool.get().unwrap();
		let trail = AuditTrail::new(test_context());
		let a = TestFixtures::funded_user(&mut conn, &trail, 10_000);
		let b = TestFixtures::funded_user(&mut conn, &trail, 10_000);
		let a_account = TestFixtures::bank_account(&mut conn, a.id).account_number;
		let b_account = TestFixtures::bank_account(&mut conn, b.id).account_number;
		(a, b, a_account, b_account)
	};
	let rounds = 10;
	let barrier = Barrier::new(2);

	thread::scope(|s| {
		let forward = s.spawn(|| {
			let mut conn = pool.get().unwrap();
			let trail = AuditTrail::new(test_context());
			barrier.wait();
			for _ in 0..rounds {
				LedgerEngine::transfer(&mut conn, &trail, a.id, &b_account, 100, None).unwrap();
			}
		});
		let backward = s.spawn(|| {
			let mut conn = pool.get().unwrap();
			let trail = AuditTrail::new(test_context());
			barrier.wait();
			for _ in 0..rounds {
				LedgerEngine::transfer(&mut conn, &trail, b.id, &a_account, 40, None).unwrap();
			}
		});
		forward.join().unwrap();
		backward.join().unwrap();
	});

	let mut conn = pool.get().unwrap();
	assert_eq!(UserRepo::find_active(&mut conn, a.id).unwrap().balance, 10_000 - 600);
	assert_eq!(UserRepo::find_active(&mut conn, b.id).unwrap().balance, 10_000 + 600);
	for user_id in [a.id, b.id] {
		let timeline = TransactionRepo::timeline(&mut conn, user_id).unwrap();
		assert_eq!(timeline.len(), 1 + 2 * rounds);
		for pair in timeline.windows(2) {
			assert_eq!(pair[1].balance_before, pair[0].balance_after);
		}
	}
}
