use super::unique_as_conflict;
use crate::{
	error::AppError,
	models::{BankAccount, NewBankAccount},
	schema::bank_accounts,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub struct BankAccountRepo;

impl BankAccountRepo {
	pub fn list_for_user(conn: &mut PgConnection, user_id: i64) -> Result<Vec<BankAccount>, AppError> {
		Ok(bank_accounts::table
			.filter(bank_accounts::user_id.eq(user_id))
			.order((bank_accounts::is_primary.desc(), bank_accounts::id.asc()))
			.select(BankAccount::as_select())
			.load(conn)?)
	}

	/// Active accounts carrying this number, across all owners.
	pub fn find_active_by_number(
		conn: &mut PgConnection,
		account_number: &str,
	) -> Result<Vec<BankAccount>, AppError> {
		Ok(bank_accounts::table
			.filter(bank_accounts::account_number.eq(account_number))
			.filter(bank_accounts::is_active.eq(true))
			.order(bank_accounts::id.asc())
			.select(BankAccount::as_select())
			.load(conn)?)
	}

	pub fn clear_primary(
		conn: &mut PgConnection,
		user_id: i64,
		now: DateTime<Utc>,
	) -> Result<usize, AppError> {
		Ok(diesel::update(
			bank_accounts::table
				.filter(bank_accounts::user_id.eq(user_id))
				.filter(bank_accounts::is_primary.eq(true)),
		)
		.set((bank_accounts::is_primary.eq(false), bank_accounts::updated_at.eq(now)))
		.execute(conn)?)
	}

	pub fn insert(
		conn: &mut PgConnection,
		account: &NewBankAccount<'_>,
	) -> Result<BankAccount, AppError> {
		diesel::insert_into(bank_accounts::table)
			.values(account)
			.returning(BankAccount::as_returning())
			.get_result(conn)
			.map_err(|e| unique_as_conflict(e, "Bank account already registered"))
	}
}
