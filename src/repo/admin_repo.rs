use super::unique_as_conflict;
use crate::{
	error::AppError,
	models::{Admin, AdminChanges, NewAdmin, PageWindow},
	schema::admins,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub struct AdminRepo;

impl AdminRepo {
	pub fn find(conn: &mut PgConnection, admin_id: i64) -> Result<Admin, AppError> {
		admins::table
			.filter(admins::id.eq(admin_id))
			.filter(admins::deleted_at.is_null())
			.select(Admin::as_select())
			.first(conn)
			.optional()?
			.ok_or(AppError::NotFound("Admin"))
	}

	pub fn find_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<Admin>, AppError> {
		Ok(admins::table
			.filter(admins::email.eq(email))
			.filter(admins::deleted_at.is_null())
			.select(Admin::as_select())
			.first(conn)
			.optional()?)
	}

	pub fn insert(conn: &mut PgConnection, admin: &NewAdmin<'_>) -> Result<Admin, AppError> {
		diesel::insert_into(admins::table)
			.values(admin)
			.returning(Admin::as_returning())
			.get_result(conn)
			.map_err(|e| unique_as_conflict(e, "Admin email is already registered"))
	}

	pub fn update(
		conn: &mut PgConnection,
		admin_id: i64,
		changes: &AdminChanges<'_>,
	) -> Result<Admin, AppError> {
		diesel::update(admins::table.filter(admins::id.eq(admin_id)).filter(admins::deleted_at.is_null()))
			.set(changes)
			.returning(Admin::as_returning())
			.get_result(conn)
			.optional()?
			.ok_or(AppError::NotFound("Admin"))
	}

	pub fn touch_last_login(
		conn: &mut PgConnection,
		admin_id: i64,
		now: DateTime<Utc>,
	) -> Result<(), AppError> {
		diesel::update(admins::table.filter(admins::id.eq(admin_id)))
			.set(admins::last_login_at.eq(now))
			.execute(conn)?;
		Ok(())
	}

	pub fn page(conn: &mut PgConnection, window: PageWindow) -> Result<(Vec<Admin>, i64), AppError> {
		let total =
			admins::table.filter(admins::deleted_at.is_null()).count().get_result::<i64>(conn)?;
		let items = admins::table
			.filter(admins::deleted_at.is_null())
			.order(admins::id.asc())
			.limit(window.limit)
			.offset(window.offset)
			.select(Admin::as_select())
			.load(conn)?;
		Ok((items, total))
	}
}
