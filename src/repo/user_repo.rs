use super::unique_as_conflict;
use crate::{
	error::AppError,
	models::{dto::UserListQuery, NewUser, PageWindow, User, UserChanges},
	schema::users,
};
use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};

pub struct UserRepo;

impl UserRepo {
	pub fn find_active(conn: &mut PgConnection, user_id: i64) -> Result<User, AppError> {
		users::table
			.filter(users::id.eq(user_id))
			.filter(users::deleted_at.is_null())
			.select(User::as_select())
			.first(conn)
			.optional()?
			.ok_or(AppError::UserNotFound)
	}

	/// Row-locks the user for the rest of the surrounding transaction.
	pub fn lock_active(conn: &mut PgConnection, user_id: i64) -> Result<User, AppError> {
		users::table
			.filter(users::id.eq(user_id))
			.filter(users::deleted_at.is_null())
			.select(User::as_select())
			.for_update()
			.first(conn)
			.optional()?
			.ok_or(AppError::UserNotFound)
	}

	pub fn find_by_phone(conn: &mut PgConnection, phone: &str) -> Result<Option<User>, AppError> {
		Ok(users::table
			.filter(users::phone.eq(phone))
			.filter(users::deleted_at.is_null())
			.select(User::as_select())
			.first(conn)
			.optional()?)
	}

	pub fn insert(conn: &mut PgConnection, new_user: &NewUser<'_>) -> Result<User, AppError> {
		diesel::insert_into(users::table)
			.values(new_user)
			.returning(User::as_returning())
			.get_result(conn)
			.map_err(|e| unique_as_conflict(e, "Phone number is already registered"))
	}

	pub fn update(
		conn: &mut PgConnection,
		user_id: i64,
		changes: &UserChanges<'_>,
	) -> Result<User, AppError> {
		diesel::update(users::table.filter(users::id.eq(user_id)).filter(users::deleted_at.is_null()))
			.set(changes)
			.returning(User::as_returning())
			.get_result(conn)
			.optional()?
			.ok_or(AppError::UserNotFound)
	}

	pub fn set_balance(
		conn: &mut PgConnection,
		user_id: i64,
		balance: i64,
		now: DateTime<Utc>,
	) -> Result<(), AppError> {
		diesel::update(users::table.filter(users::id.eq(user_id)))
			.set((users::balance.eq(balance), users::updated_at.eq(now)))
			.execute(conn)?;
		Ok(())
	}

	pub fn set_status(
		conn: &mut PgConnection,
		user_id: i64,
		status: i16,
		now: DateTime<Utc>,
	) -> Result<User, AppError> {
		Ok(diesel::update(users::table.filter(users::id.eq(user_id)))
			.set((users::status.eq(status), users::updated_at.eq(now)))
			.returning(User::as_returning())
			.get_result(conn)?)
	}

	pub fn set_pin_hash(
		conn: &mut PgConnection,
		user_id: i64,
		pin_hash: &str,
		now: DateTime<Utc>,
	) -> Result<(), AppError> {
		diesel::update(users::table.filter(users::id.eq(user_id)))
			.set((users::pin_hash.eq(pin_hash), users::updated_at.eq(now)))
			.execute(conn)?;
		Ok(())
	}

	pub fn list(
		conn: &mut PgConnection,
		query: &UserListQuery,
		window: PageWindow,
	) -> Result<(Vec<User>, i64), AppError> {
		let total = Self::filtered(query).count().get_result::<i64>(conn)?;
		let items = Self::filtered(query)
			.order((users::created_at.desc(), users::id.desc()))
			.limit(window.limit)
			.offset(window.offset)
			.select(User::as_select())
			.load(conn)?;
		Ok((items, total))
	}

	fn filtered(query: &UserListQuery) -> users::BoxedQuery<'_, Pg> {
		let mut q = users::table.filter(users::deleted_at.is_null()).into_boxed();
		if let Some(status) = query.status {
			q = q.filter(users::status.eq(status));
		}
		if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
			let pattern = format!("%{}%", search.trim());
			q = q.filter(users::name.ilike(pattern.clone()).or(users::phone.like(pattern)));
		}
		q
	}
}
