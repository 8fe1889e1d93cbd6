use crate::{
	error::AppError,
	models::{NewTransaction, PageWindow, Transaction},
	schema::transactions,
};
use diesel::prelude::*;

pub struct TransactionRepo;

impl TransactionRepo {
	pub fn insert(
		conn: &mut PgConnection,
		entry: &NewTransaction<'_>,
	) -> Result<Transaction, AppError> {
		Ok(diesel::insert_into(transactions::table)
			.values(entry)
			.returning(Transaction::as_returning())
			.get_result(conn)?)
	}

	pub fn find_for_user(
		conn: &mut PgConnection,
		user_id: i64,
		transaction_id: i64,
	) -> Result<Transaction, AppError> {
		transactions::table
			.filter(transactions::id.eq(transaction_id))
			.filter(transactions::user_id.eq(user_id))
			.select(Transaction::as_select())
			.first(conn)
			.optional()?
			.ok_or(AppError::NotFound("Transaction"))
	}

	pub fn find(conn: &mut PgConnection, transaction_id: i64) -> Result<Transaction, AppError> {
		transactions::table
			.find(transaction_id)
			.select(Transaction::as_select())
			.first(conn)
			.optional()?
			.ok_or(AppError::NotFound("Transaction"))
	}

	/// Newest first; `created_at DESC, id DESC` is the user's balance timeline reversed.
	pub fn page_for_user(
		conn: &mut PgConnection,
		user_id: i64,
		window: PageWindow,
	) -> Result<(Vec<Transaction>, i64), AppError> {
		let total = transactions::table
			.filter(transactions::user_id.eq(user_id))
			.count()
			.get_result::<i64>(conn)?;
		let items = transactions::table
			.filter(transactions::user_id.eq(user_id))
			.order((transactions::created_at.desc(), transactions::id.desc()))
			.limit(window.limit)
			.offset(window.offset)
			.select(Transaction::as_select())
			.load(conn)?;
		Ok((items, total))
	}

	/// Full timeline in commit order.
	pub fn timeline(conn: &mut PgConnection, user_id: i64) -> Result<Vec<Transaction>, AppError> {
		Ok(transactions::table
			.filter(transactions::user_id.eq(user_id))
			.filter(transactions::status.eq("completed"))
			.order((transactions::created_at.asc(), transactions::id.asc()))
			.select(Transaction::as_select())
			.load(conn)?)
	}
}
