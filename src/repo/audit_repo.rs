use super::{day_after, day_start};
use crate::{
	error::AppError,
	models::{
		AuditFilter, AuditLog, LoginAudit, LoginAuditFilter, NewAuditLog, NewLoginAudit,
		PageWindow,
	},
	schema::{audit_logs, login_audits},
};
use diesel::{pg::Pg, prelude::*};

pub struct AuditRepo;

impl AuditRepo {
	pub fn insert(conn: &mut PgConnection, entry: &NewAuditLog) -> Result<(), AppError> {
		diesel::insert_into(audit_logs::table).values(entry).execute(conn)?;
		Ok(())
	}

	pub fn insert_login(conn: &mut PgConnection, entry: &NewLoginAudit) -> Result<(), AppError> {
		diesel::insert_into(login_audits::table).values(entry).execute(conn)?;
		Ok(())
	}

	pub fn page(
		conn: &mut PgConnection,
		filter: &AuditFilter,
		window: PageWindow,
	) -> Result<(Vec<AuditLog>, i64), AppError> {
		let total = Self::filtered(filter).count().get_result::<i64>(conn)?;
		let items = Self::filtered(filter)
			.order((audit_logs::created_at.desc(), audit_logs::id.desc()))
			.limit(window.limit)
			.offset(window.offset)
			.select(AuditLog::as_select())
			.load(conn)?;
		Ok((items, total))
	}

	pub fn page_logins(
		conn: &mut PgConnection,
		filter: &LoginAuditFilter,
		window: PageWindow,
	) -> Result<(Vec<LoginAudit>, i64), AppError> {
		let total = Self::filtered_logins(filter).count().get_result::<i64>(conn)?;
		let items = Self::filtered_logins(filter)
			.order((login_audits::created_at.desc(), login_audits::id.desc()))
			.limit(window.limit)
			.offset(window.offset)
			.select(LoginAudit::as_select())
			.load(conn)?;
		Ok((items, total))
	}

	fn filtered(filter: &AuditFilter) -> audit_logs::BoxedQuery<'_, Pg> {
		let mut q = audit_logs::table.into_boxed();
		if let Some(entity_type) = filter.entity_type.as_deref() {
			q = q.filter(audit_logs::entity_type.eq(entity_type));
		}
		if let Some(entity_id) = filter.entity_id.as_deref() {
			q = q.filter(audit_logs::entity_id.eq(entity_id));
		}
		if let Some(user_id) = filter.user_id {
			q = q.filter(audit_logs::user_id.eq(user_id));
		}
		if let Some(admin_id) = filter.admin_id {
			q = q.filter(audit_logs::admin_id.eq(admin_id));
		}
		if let Some(action) = filter.action.as_deref() {
			q = q.filter(audit_logs::action.eq(action));
		}
		if let Some(ip) = filter.ip_address.as_deref() {
			q = q.filter(audit_logs::ip_address.eq(ip));
		}
		if let Some(from) = filter.date_from {
			q = q.filter(audit_logs::created_at.ge(day_start(from)));
		}
		if let Some(to) = filter.date_to {
			q = q.filter(audit_logs::created_at.lt(day_after(to)));
		}
		q
	}

	fn filtered_logins(filter: &LoginAuditFilter) -> login_audits::BoxedQuery<'_, Pg> {
		let mut q = login_audits::table.into_boxed();
		if let Some(user_id) = filter.user_id {
			q = q.filter(login_audits::user_id.eq(user_id));
		}
		if let Some(admin_id) = filter.admin_id {
			q = q.filter(login_audits::admin_id.eq(admin_id));
		}
		if let Some(login_type) = filter.login_type.as_deref() {
			q = q.filter(login_audits::login_type.eq(login_type));
		}
		if let Some(status) = filter.status.as_deref() {
			q = q.filter(login_audits::status.eq(status));
		}
		if let Some(ip) = filter.ip_address.as_deref() {
			q = q.filter(login_audits::ip_address.eq(ip));
		}
		if let Some(from) = filter.date_from {
			q = q.filter(login_audits::created_at.ge(day_start(from)));
		}
		if let Some(to) = filter.date_to {
			q = q.filter(login_audits::created_at.lt(day_after(to)));
		}
		q
	}
}
