use crate::{
	error::AppError,
	schema::{bank_accounts, device_sessions, users},
};
use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

/// Account status of a customer, persisted as a small integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum UserStatus {
	Inactive,
	Active,
	Blocked,
}

impl UserStatus {
	pub fn code(&self) -> i16 {
		match self {
			UserStatus::Inactive => 0,
			UserStatus::Active => 1,
			UserStatus::Blocked => 2,
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			UserStatus::Inactive => "inactive",
			UserStatus::Active => "active",
			UserStatus::Blocked => "blocked",
		}
	}
}

impl From<UserStatus> for i16 {
	fn from(status: UserStatus) -> Self {
		status.code()
	}
}

impl TryFrom<i16> for UserStatus {
	type Error = AppError;

	fn try_from(code: i16) -> Result<Self, Self::Error> {
		match code {
			0 => Ok(UserStatus::Inactive),
			1 => Ok(UserStatus::Active),
			2 => Ok(UserStatus::Blocked),
			other => Err(AppError::ValidationFailed(format!("invalid user status code: {}", other))),
		}
	}
}

string_enum!(UserRole {
	User => "user",
	Admin => "admin",
	Owner => "owner",
});

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Pg))]
pub struct User {
	pub id: i64,
	pub name: String,
	pub phone: String,
	pub email: Option<String>,
	#[serde(skip_serializing, default)]
	pub pin_hash: String,
	pub balance: i64,
	pub status: i16,
	pub role: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
	pub fn status(&self) -> Result<UserStatus, AppError> {
		UserStatus::try_from(self.status)
	}
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
	pub name: &'a str,
	pub phone: &'a str,
	pub email: Option<&'a str>,
	pub pin_hash: &'a str,
	pub role: &'a str,
	pub status: i16,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = users)]
pub struct UserChanges<'a> {
	pub name: Option<&'a str>,
	pub email: Option<&'a str>,
	pub role: Option<&'a str>,
	pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = bank_accounts)]
#[diesel(check_for_backend(Pg))]
pub struct BankAccount {
	pub id: i64,
	pub user_id: i64,
	pub account_number: String,
	pub account_name: String,
	pub bank_code: String,
	pub is_active: bool,
	pub is_primary: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = bank_accounts)]
pub struct NewBankAccount<'a> {
	pub user_id: i64,
	pub account_number: &'a str,
	pub account_name: &'a str,
	pub bank_code: &'a str,
	pub is_primary: bool,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = device_sessions)]
#[diesel(check_for_backend(Pg))]
pub struct DeviceSession {
	pub id: i64,
	pub user_id: i64,
	#[serde(skip_serializing, default)]
	pub session_token: String,
	#[serde(skip_serializing, default)]
	pub refresh_token: String,
	pub device_type: String,
	pub device_id: String,
	pub device_name: String,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	pub is_active: bool,
	pub last_activity_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = device_sessions)]
pub struct NewDeviceSession<'a> {
	pub user_id: i64,
	pub session_token: &'a str,
	pub refresh_token: &'a str,
	pub device_type: &'a str,
	pub device_id: &'a str,
	pub device_name: &'a str,
	pub ip_address: Option<&'a str>,
	pub user_agent: Option<&'a str>,
	pub expires_at: DateTime<Utc>,
}
