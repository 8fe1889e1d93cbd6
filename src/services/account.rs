use super::audit::{AuditEntry, AuditTrail};
use crate::{
	constants::{DEFAULT_PAGE_LIMIT, ENTITY_BANK_ACCOUNT, ENTITY_USER, MAX_PAGE_LIMIT},
	error::AppError,
	models::{
		dto::{AddBankAccountRequest, ProfileUpdate},
		Actor, AuditAction, BankAccount, NewBankAccount, Page, PageRequest, Transaction, User,
		UserChanges,
	},
	repo::{BankAccountRepo, TransactionRepo, UserRepo},
};
use chrono::Utc;
use diesel::prelude::*;

/// Customer self-service: profile, linked bank accounts and ledger history.
pub struct AccountService;

impl AccountService {
	pub fn profile(conn: &mut PgConnection, user_id: i64) -> Result<User, AppError> {
		UserRepo::find_active(conn, user_id)
	}

	pub fn update_profile(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		user_id: i64,
		req: &ProfileUpdate,
	) -> Result<User, AppError> {
		let name = req.name.as_deref().map(str::trim);
		if name == Some("") {
			return Err(AppError::ValidationFailed("name must not be blank".to_string()));
		}
		let (before, after) = conn.transaction::<_, AppError, _>(|conn| {
			let before = UserRepo::lock_active(conn, user_id)?;
			let after = UserRepo::update(
				conn,
				user_id,
				&UserChanges {
					name,
					email: req.email.as_deref(),
					role: None,
					updated_at: Some(Utc::now()),
				},
			)?;
			Ok((before, after))
		})?;
		trail.record(
			conn,
			AuditEntry::new(Actor::User(user_id), AuditAction::Update, ENTITY_USER, user_id)
				.old(&before)
				.new_values(&after),
			200,
		);
		Ok(after)
	}

	pub fn bank_accounts(conn: &mut PgConnection, user_id: i64) -> Result<Vec<BankAccount>, AppError> {
		UserRepo::find_active(conn, user_id)?;
		BankAccountRepo::list_for_user(conn, user_id)
	}

	/// Links an account. A new primary account demotes the previous one in the same transaction.
	pub fn add_bank_account(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		user_id: i64,
		req: &AddBankAccountRequest,
	) -> Result<BankAccount, AppError> {
		let now = Utc::now();
		let account = conn.transaction::<_, AppError, _>(|conn| {
			UserRepo::lock_active(conn, user_id)?;
			let is_primary = match req.is_primary {
				Some(flag) => flag,
				None => BankAccountRepo::list_for_user(conn, user_id)?.is_empty(),
			};
			if is_primary {
				BankAccountRepo::clear_primary(conn, user_id, now)?;
			}
			BankAccountRepo::insert(
				conn,
				&NewBankAccount {
					user_id,
					account_number: req.account_number.trim(),
					account_name: req.account_name.trim(),
					bank_code: req.bank_code.trim(),
					is_primary,
				},
			)
		})?;
		log::info!("User {} linked bank account #{}", user_id, account.id);
		trail.record(
			conn,
			AuditEntry::new(Actor::User(user_id), AuditAction::Create, ENTITY_BANK_ACCOUNT, account.id)
				.new_values(&account),
			201,
		);
		Ok(account)
	}

	pub fn transactions(
		conn: &mut PgConnection,
		user_id: i64,
		paging: PageRequest,
	) -> Result<Page<Transaction>, AppError> {
		let window = paging.window(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
		let (items, total) = TransactionRepo::page_for_user(conn, user_id, window)?;
		Ok(window.wrap(items, total))
	}

	pub fn transaction(
		conn: &mut PgConnection,
		user_id: i64,
		transaction_id: i64,
	) -> Result<Transaction, AppError> {
		TransactionRepo::find_for_user(conn, user_id, transaction_id)
	}
}
