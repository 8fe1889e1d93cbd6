use super::audit::{AuditEntry, AuditTrail};
use crate::{
	constants::ENTITY_TRANSACTION,
	error::AppError,
	models::{
		Actor, AuditAction, BankAccount, NewTransaction, PendingTransaction, Transaction,
		TransactionStatus, TransactionType, TransferReceipt, User, UserStatus,
	},
	repo::{BankAccountRepo, PendingTransactionRepo, TransactionRepo, UserRepo},
};
use chrono::Utc;
use diesel::prelude::*;

/// Balance after applying `kind` for `amount` to `current`.
pub fn next_balance(kind: TransactionType, current: i64, amount: i64) -> Result<i64, AppError> {
	if amount < 1 {
		return Err(AppError::InvalidAmount);
	}
	let next = projected_balance(kind, current, amount)
		.ok_or_else(|| AppError::ValidationFailed("balance would overflow".to_string()))?;
	if next < 0 {
		return Err(AppError::InsufficientFunds);
	}
	Ok(next)
}

/// Unchecked projection; may go negative. `None` only on overflow.
pub fn projected_balance(kind: TransactionType, current: i64, amount: i64) -> Option<i64> {
	match kind {
		TransactionType::Topup | TransactionType::TransferIn | TransactionType::BalanceAdjustment =>
			current.checked_add(amount),
		TransactionType::Withdraw | TransactionType::TransferOut => current.checked_sub(amount),
		TransactionType::BalanceSet => Some(amount),
	}
}

/// Customer money movement needs an active account on every side it touches.
pub fn ensure_active(user: &User, is_receiver: bool) -> Result<(), AppError> {
	if user.status()? == UserStatus::Active {
		return Ok(());
	}
	let msg = if is_receiver { "Recipient account is not active" } else { "Account is not active" };
	Err(AppError::Forbidden(msg.to_string()))
}

/// Picks the receiving account for a transfer. Any match owned by the sender is a self-transfer.
pub fn resolve_recipient(
	sender_id: i64,
	matches: Vec<BankAccount>,
) -> Result<BankAccount, AppError> {
	if matches.iter().any(|a| a.user_id == sender_id) {
		return Err(AppError::SelfTransfer);
	}
	let mut iter = matches.into_iter();
	let first = iter.next().ok_or(AppError::AccountNotFound)?;
	if iter.any(|a| a.user_id != first.user_id) {
		return Err(AppError::ValidationFailed(
			"account number is registered to more than one customer".to_string(),
		));
	}
	Ok(first)
}

/// `(sender leg, receiver leg)` descriptions; each names the counterparty.
pub fn transfer_descriptions(
	sender: &User,
	receiver: &User,
	account: &BankAccount,
	note: Option<&str>,
) -> (String, String) {
	let note = note.map(str::trim).filter(|n| !n.is_empty());
	let out = format!("Transfer to {} ({} {})", receiver.name, account.bank_code, account.account_number);
	let inn = format!("Transfer from {} ({})", sender.name, sender.phone);
	match note {
		Some(n) => (format!("{}: {}", out, n), format!("{}: {}", inn, n)),
		None => (out, inn),
	}
}

/// What happened when an approved change reached the ledger.
#[derive(Debug)]
pub enum ApplyOutcome {
	Applied(Transaction),
	/// Balance moved since staging and the change no longer fits; the pending snapshot was refreshed.
	Stale(PendingTransaction),
}

pub struct LedgerEngine;

impl LedgerEngine {
	pub fn topup(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		user_id: i64,
		amount: i64,
		description: Option<&str>,
	) -> Result<Transaction, AppError> {
		let txn = Self::execute(
			conn,
			user_id,
			true,
			TransactionType::Topup,
			amount,
			description.unwrap_or("Top up"),
		)?;
		log::info!("Top-up {} for user {} -> balance {}", amount, user_id, txn.balance_after);
		trail.record(conn, created(Actor::User(user_id), &txn), 201);
		Ok(txn)
	}

	pub fn withdraw(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		user_id: i64,
		amount: i64,
		description: Option<&str>,
	) -> Result<Transaction, AppError> {
		let txn = Self::execute(
			conn,
			user_id,
			true,
			TransactionType::Withdraw,
			amount,
			description.unwrap_or("Withdraw"),
		)?;
		log::info!("Withdraw {} for user {} -> balance {}", amount, user_id, txn.balance_after);
		trail.record(conn, created(Actor::User(user_id), &txn), 201);
		Ok(txn)
	}

	pub fn transfer(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		sender_id: i64,
		to_account_number: &str,
		amount: i64,
		description: Option<&str>,
	) -> Result<TransferReceipt, AppError> {
		if amount < 1 {
			return Err(AppError::InvalidAmount);
		}
		let receipt = conn.transaction::<_, AppError, _>(|conn| {
			let account = resolve_recipient(
				sender_id,
				BankAccountRepo::find_active_by_number(conn, to_account_number)?,
			)?;
			let receiver_id = account.user_id;

			// ascending id order on both rows, whichever side sends
			let (first, second) = if sender_id < receiver_id {
				(sender_id, receiver_id)
			} else {
				(receiver_id, sender_id)
			};
			let first = lock_party(conn, first, sender_id)?;
			let second = lock_party(conn, second, sender_id)?;
			let (sender, receiver) =
				if first.id == sender_id { (first, second) } else { (second, first) };

			let (out_desc, in_desc) =
				transfer_descriptions(&sender, &receiver, &account, description);
			let now = Utc::now();
			let transfer_out =
				post(conn, &sender, TransactionType::TransferOut, amount, &out_desc, now)?;
			let transfer_in =
				post(conn, &receiver, TransactionType::TransferIn, amount, &in_desc, now)?;
			Ok(TransferReceipt { transfer_out, transfer_in })
		})?;

		log::info!(
			"Transfer {} from user {} to user {} (out #{}, in #{})",
			amount,
			sender_id,
			receipt.transfer_in.user_id,
			receipt.transfer_out.id,
			receipt.transfer_in.id
		);
		trail.record(
			conn,
			AuditEntry::new(
				Actor::User(sender_id),
				AuditAction::Create,
				ENTITY_TRANSACTION,
				receipt.transfer_out.id,
			)
			.new_values(&receipt),
			201,
		);
		Ok(receipt)
	}

	/// Admin change below every approval threshold, executed at once.
	pub fn apply_direct_change(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		admin_id: i64,
		user_id: i64,
		kind: TransactionType,
		amount: i64,
		description: &str,
	) -> Result<Transaction, AppError> {
		if !kind.is_admin_change() {
			return Err(AppError::ValidationFailed(format!("{} is not an admin balance change", kind)));
		}
		// admin corrections still reach blocked accounts
		let txn = Self::execute(conn, user_id, false, kind, amount, description)?;
		log::info!(
			"Admin {} applied {} {} to user {} -> balance {}",
			admin_id,
			kind,
			amount,
			user_id,
			txn.balance_after
		);
		trail.record(conn, created(Actor::Admin(admin_id), &txn), 201);
		Ok(txn)
	}

	/// Runs inside the caller's decide transaction, with the pending row already locked.
	pub fn apply_approved_change(
		conn: &mut PgConnection,
		pending: &PendingTransaction,
	) -> Result<ApplyOutcome, AppError> {
		let kind: TransactionType = pending.transaction_type.parse()?;
		let user = UserRepo::lock_active(conn, pending.user_id)?;
		let now = Utc::now();

		if user.balance != pending.current_balance {
			let expected = projected_balance(kind, user.balance, pending.amount)
				.ok_or_else(|| AppError::ValidationFailed("balance would overflow".to_string()))?;
			log::warn!(
				"Pending #{}: balance moved {} -> {}, expected now {}",
				pending.id,
				pending.current_balance,
				user.balance,
				expected
			);
			let refreshed =
				PendingTransactionRepo::refresh_snapshot(conn, pending.id, user.balance, expected, now)?;
			if expected < 0 {
				return Ok(ApplyOutcome::Stale(refreshed));
			}
		}

		let description = if pending.description.is_empty() {
			format!("Approved {} #{}", kind, pending.id)
		} else {
			pending.description.clone()
		};
		let txn = post(conn, &user, kind, pending.amount, &description, now)?;
		Ok(ApplyOutcome::Applied(txn))
	}

	fn execute(
		conn: &mut PgConnection,
		user_id: i64,
		by_customer: bool,
		kind: TransactionType,
		amount: i64,
		description: &str,
	) -> Result<Transaction, AppError> {
		if amount < 1 {
			return Err(AppError::InvalidAmount);
		}
		conn.transaction::<_, AppError, _>(|conn| {
			let user = UserRepo::lock_active(conn, user_id)?;
			if by_customer {
				ensure_active(&user, false)?;
			}
			post(conn, &user, kind, amount, description, Utc::now())
		})
	}
}

fn lock_party(conn: &mut PgConnection, user_id: i64, sender_id: i64) -> Result<User, AppError> {
	let user = match UserRepo::lock_active(conn, user_id) {
		Err(AppError::UserNotFound) if user_id != sender_id => Err(AppError::AccountNotFound),
		other => other,
	}?;
	ensure_active(&user, user_id != sender_id)?;
	Ok(user)
}

/// Writes the new balance and its ledger row. The user row must be locked by the caller.
fn post(
	conn: &mut PgConnection,
	user: &User,
	kind: TransactionType,
	amount: i64,
	description: &str,
	now: chrono::DateTime<Utc>,
) -> Result<Transaction, AppError> {
	let balance_after = next_balance(kind, user.balance, amount)?;
	UserRepo::set_balance(conn, user.id, balance_after, now)?;
	TransactionRepo::insert(
		conn,
		&NewTransaction {
			user_id: user.id,
			transaction_type: kind.as_str(),
			amount,
			balance_before: user.balance,
			balance_after,
			description,
			status: TransactionStatus::Completed.as_str(),
			created_at: now,
		},
	)
}

fn created(actor: Actor, txn: &Transaction) -> AuditEntry {
	AuditEntry::new(actor, AuditAction::Create, ENTITY_TRANSACTION, txn.id).new_values(txn)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn account(id: i64, user_id: i64) -> BankAccount {
		let now = Utc::now();
		BankAccount {
			id,
			user_id,
			account_number: "ACC-2".into(),
			account_name: "Savings".into(),
			bank_code: "014".into(),
			is_active: true,
			is_primary: false,
			created_at: now,
			updated_at: now,
		}
	}

	fn user(id: i64, name: &str) -> User {
		let now = Utc::now();
		User {
			id,
			name: name.into(),
			phone: format!("0812{}", id),
			email: None,
			pin_hash: String::new(),
			balance: 0,
			status: 1,
			role: "user".into(),
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}

	#[test]
	fn test_credit_and_debit_rules() {
		assert_eq!(next_balance(TransactionType::Topup, 0, 10_000).unwrap(), 10_000);
		assert_eq!(next_balance(TransactionType::Withdraw, 10_000, 3_000).unwrap(), 7_000);
		assert_eq!(next_balance(TransactionType::TransferIn, 5, 5).unwrap(), 10);
		assert_eq!(next_balance(TransactionType::TransferOut, 5, 5).unwrap(), 0);
		assert_eq!(next_balance(TransactionType::BalanceAdjustment, 7, 3).unwrap(), 10);
		assert_eq!(next_balance(TransactionType::BalanceSet, 9_999, 250).unwrap(), 250);
	}

	#[test]
	fn test_non_positive_amounts_rejected() {
		assert!(matches!(next_balance(TransactionType::Topup, 0, 0), Err(AppError::InvalidAmount)));
		assert!(matches!(
			next_balance(TransactionType::Withdraw, 50, -1),
			Err(AppError::InvalidAmount)
		));
	}

	#[test]
	fn test_withdraw_exact_balance_then_one_more() {
		let after = next_balance(TransactionType::Withdraw, 700, 700).unwrap();
		assert_eq!(after, 0);
		assert!(matches!(
			next_balance(TransactionType::Withdraw, after, 1),
			Err(AppError::InsufficientFunds)
		));
	}

	#[test]
	fn test_overflow_is_not_a_balance() {
		assert!(matches!(
			next_balance(TransactionType::Topup, i64::MAX, 1),
			Err(AppError::ValidationFailed(_))
		));
	}

	#[test]
	fn test_projection_can_go_negative() {
		assert_eq!(projected_balance(TransactionType::Withdraw, 5_000, 8_000), Some(-3_000));
	}

	#[test]
	fn test_recipient_resolution() {
		assert!(matches!(resolve_recipient(1, vec![]), Err(AppError::AccountNotFound)));
		assert!(matches!(resolve_recipient(1, vec![account(3, 1)]), Err(AppError::SelfTransfer)));
		assert!(matches!(
			resolve_recipient(1, vec![account(3, 2), account(4, 1)]),
			Err(AppError::SelfTransfer)
		));
		assert_eq!(resolve_recipient(1, vec![account(3, 2)]).unwrap().id, 3);
		assert!(matches!(
			resolve_recipient(1, vec![account(3, 2), account(4, 5)]),
			Err(AppError::ValidationFailed(_))
		));
	}

	#[test]
	fn test_only_active_accounts_move_money() {
		let mut u = user(1, "Budi");
		assert!(ensure_active(&u, false).is_ok());
		u.status = 2;
		assert!(matches!(ensure_active(&u, false), Err(AppError::Forbidden(m)) if m == "Account is not active"));
		u.status = 0;
		assert!(
			matches!(ensure_active(&u, true), Err(AppError::Forbidden(m)) if m == "Recipient account is not active")
		);
	}

	#[test]
	fn test_transfer_descriptions_name_counterparty() {
		let (out, inn) =
			transfer_descriptions(&user(1, "Budi"), &user(2, "Sari"), &account(3, 2), Some("gift"));
		assert_eq!(out, "Transfer to Sari (014 ACC-2): gift");
		assert_eq!(inn, "Transfer from Budi (08121): gift");

		let (out, _) =
			transfer_descriptions(&user(1, "Budi"), &user(2, "Sari"), &account(3, 2), Some("  "));
		assert_eq!(out, "Transfer to Sari (014 ACC-2)");
	}
}
