use crate::schema::admins;
use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

string_enum!(AdminRole {
	Admin => "admin",
	Super => "super",
});

string_enum!(AdminStatus {
	Active => "active",
	Inactive => "inactive",
	Blocked => "blocked",
});

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = admins)]
#[diesel(check_for_backend(Pg))]
pub struct Admin {
	pub id: i64,
	pub name: String,
	pub email: String,
	#[serde(skip_serializing, default)]
	pub password_hash: String,
	pub role: String,
	pub status: String,
	pub last_login_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = admins)]
pub struct NewAdmin<'a> {
	pub name: &'a str,
	pub email: &'a str,
	pub password_hash: &'a str,
	pub role: &'a str,
	pub status: &'a str,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = admins)]
pub struct AdminChanges<'a> {
	pub name: Option<&'a str>,
	pub role: Option<&'a str>,
	pub status: Option<&'a str>,
	pub updated_at: Option<DateTime<Utc>>,
}
