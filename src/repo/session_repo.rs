use super::unique_as_conflict;
use crate::{
	error::AppError,
	models::{DeviceSession, NewDeviceSession},
	schema::device_sessions,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub struct SessionRepo;

impl SessionRepo {
	pub fn find_active_for_device(
		conn: &mut PgConnection,
		user_id: i64,
		device_type: &str,
		device_id: &str,
		device_name: &str,
		now: DateTime<Utc>,
	) -> Result<Option<DeviceSession>, AppError> {
		Ok(device_sessions::table
			.filter(device_sessions::user_id.eq(user_id))
			.filter(device_sessions::device_type.eq(device_type))
			.filter(device_sessions::device_id.eq(device_id))
			.filter(device_sessions::device_name.eq(device_name))
			.filter(device_sessions::is_active.eq(true))
			.filter(device_sessions::expires_at.gt(now))
			.select(DeviceSession::as_select())
			.first(conn)
			.optional()?)
	}

	pub fn insert(
		conn: &mut PgConnection,
		session: &NewDeviceSession<'_>,
	) -> Result<DeviceSession, AppError> {
		diesel::insert_into(device_sessions::table)
			.values(session)
			.returning(DeviceSession::as_returning())
			.get_result(conn)
			.map_err(|e| unique_as_conflict(e, "Session token collision"))
	}

	pub fn list_active(
		conn: &mut PgConnection,
		user_id: i64,
		now: DateTime<Utc>,
	) -> Result<Vec<DeviceSession>, AppError> {
		Ok(device_sessions::table
			.filter(device_sessions::user_id.eq(user_id))
			.filter(device_sessions::is_active.eq(true))
			.filter(device_sessions::expires_at.gt(now))
			.order(device_sessions::last_activity_at.desc())
			.select(DeviceSession::as_select())
			.load(conn)?)
	}

	pub fn deactivate(
		conn: &mut PgConnection,
		user_id: i64,
		session_id: i64,
	) -> Result<usize, AppError> {
		Ok(diesel::update(
			device_sessions::table
				.filter(device_sessions::id.eq(session_id))
				.filter(device_sessions::user_id.eq(user_id))
				.filter(device_sessions::is_active.eq(true)),
		)
		.set(device_sessions::is_active.eq(false))
		.execute(conn)?)
	}

	pub fn deactivate_others(
		conn: &mut PgConnection,
		user_id: i64,
		keep_session_id: i64,
	) -> Result<usize, AppError> {
		Ok(diesel::update(
			device_sessions::table
				.filter(device_sessions::user_id.eq(user_id))
				.filter(device_sessions::id.ne(keep_session_id))
				.filter(device_sessions::is_active.eq(true)),
		)
		.set(device_sessions::is_active.eq(false))
		.execute(conn)?)
	}

	/// Marks a live session as used. `false` once it is closed, expired, or not the caller's.
	pub fn touch_live(
		conn: &mut PgConnection,
		user_id: i64,
		session_id: i64,
		now: DateTime<Utc>,
	) -> Result<bool, AppError> {
		let touched = diesel::update(
			device_sessions::table
				.filter(device_sessions::id.eq(session_id))
				.filter(device_sessions::user_id.eq(user_id))
				.filter(device_sessions::is_active.eq(true))
				.filter(device_sessions::expires_at.gt(now)),
		)
		.set(device_sessions::last_activity_at.eq(now))
		.execute(conn)?;
		Ok(touched > 0)
	}
}
