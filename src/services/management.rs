use super::audit::{AuditEntry, AuditTrail};
use crate::{
	constants::{DEFAULT_PAGE_LIMIT, ENTITY_ADMIN, ENTITY_USER, MAX_PAGE_LIMIT},
	error::AppError,
	models::{
		dto::{
			CreateAdminRequest, CreateUserRequest, UpdateAdminRequest, UpdateUserRequest,
			UserListQuery,
		},
		Actor, Admin, AdminChanges, AdminRole, AdminStatus, AuditAction, NewAdmin, NewUser, Page,
		PageRequest, Transaction, User, UserChanges, UserRole, UserStatus,
	},
	repo::{AdminRepo, TransactionRepo, UserRepo},
};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use diesel::prelude::*;

/// An owner may not strip their own owner rights or lock themselves out.
pub fn check_self_update(
	owner_id: i64,
	admin_id: i64,
	req: &UpdateAdminRequest,
) -> Result<(), AppError> {
	if owner_id != admin_id {
		return Ok(());
	}
	if matches!(req.role, Some(AdminRole::Admin)) {
		return Err(AppError::ValidationFailed("owners cannot demote themselves".to_string()));
	}
	if matches!(req.status, Some(s) if s != AdminStatus::Active) {
		return Err(AppError::ValidationFailed("owners cannot deactivate themselves".to_string()));
	}
	Ok(())
}

/// Back-office management of customer and admin accounts.
pub struct ManagementService;

impl ManagementService {
	pub fn list_users(conn: &mut PgConnection, query: &UserListQuery) -> Result<Page<User>, AppError> {
		if let Some(code) = query.status {
			UserStatus::try_from(code)?;
		}
		let window =
			PageRequest { page: query.page, limit: query.limit }.window(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
		let (items, total) = UserRepo::list(conn, query, window)?;
		Ok(window.wrap(items, total))
	}

	pub fn get_user(conn: &mut PgConnection, user_id: i64) -> Result<User, AppError> {
		UserRepo::find_active(conn, user_id)
	}

	pub fn user_transactions(
		conn: &mut PgConnection,
		user_id: i64,
		paging: PageRequest,
	) -> Result<Page<Transaction>, AppError> {
		UserRepo::find_active(conn, user_id)?;
		let window = paging.window(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
		let (items, total) = TransactionRepo::page_for_user(conn, user_id, window)?;
		Ok(window.wrap(items, total))
	}

	pub fn create_user(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		owner_id: i64,
		req: &CreateUserRequest,
	) -> Result<User, AppError> {
		if !req.pin.chars().all(|c| c.is_ascii_digit()) {
			return Err(AppError::ValidationFailed("pin must be numeric".to_string()));
		}
		let pin_hash = hash(&req.pin, DEFAULT_COST)?;
		let user = UserRepo::insert(
			conn,
			&NewUser {
				name: req.name.trim(),
				phone: req.phone.trim(),
				email: req.email.as_deref(),
				pin_hash: &pin_hash,
				role: req.role.unwrap_or(UserRole::User).as_str(),
				status: UserStatus::Active.code(),
			},
		)?;
		log::info!("Owner {} created user {}", owner_id, user.id);
		trail.record(
			conn,
			AuditEntry::new(Actor::Admin(owner_id), AuditAction::Create, ENTITY_USER, user.id)
				.new_values(&user),
			201,
		);
		Ok(user)
	}

	pub fn update_user(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		owner_id: i64,
		user_id: i64,
		req: &UpdateUserRequest,
	) -> Result<User, AppError> {
		let (before, after) = conn.transaction::<_, AppError, _>(|conn| {
			let before = UserRepo::lock_active(conn, user_id)?;
			let after = UserRepo::update(
				conn,
				user_id,
				&UserChanges {
					name: req.name.as_deref().map(str::trim),
					email: req.email.as_deref(),
					role: req.role.map(|r| r.as_str()),
					updated_at: Some(Utc::now()),
				},
			)?;
			Ok((before, after))
		})?;
		log::info!("Owner {} updated user {}", owner_id, user_id);
		trail.record(
			conn,
			AuditEntry::new(Actor::Admin(owner_id), AuditAction::Update, ENTITY_USER, user_id)
				.old(&before)
				.new_values(&after),
			200,
		);
		Ok(after)
	}

	pub fn list_admins(conn: &mut PgConnection, paging: PageRequest) -> Result<Page<Admin>, AppError> {
		let window = paging.window(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
		let (items, total) = AdminRepo::page(conn, window)?;
		Ok(window.wrap(items, total))
	}

	pub fn get_admin(conn: &mut PgConnection, admin_id: i64) -> Result<Admin, AppError> {
		AdminRepo::find(conn, admin_id)
	}

	pub fn create_admin(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		owner_id: i64,
		req: &CreateAdminRequest,
	) -> Result<Admin, AppError> {
		let password_hash = hash(&req.password, DEFAULT_COST)?;
		let admin = AdminRepo::insert(
			conn,
			&NewAdmin {
				name: req.name.trim(),
				email: req.email.trim(),
				password_hash: &password_hash,
				role: req.role.unwrap_or(AdminRole::Admin).as_str(),
				status: AdminStatus::Active.as_str(),
			},
		)?;
		log::info!("Owner {} created admin {} ({})", owner_id, admin.id, admin.role);
		trail.record(
			conn,
			AuditEntry::new(Actor::Admin(owner_id), AuditAction::Create, ENTITY_ADMIN, admin.id)
				.new_values(&admin),
			201,
		);
		Ok(admin)
	}

	pub fn update_admin(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		owner_id: i64,
		admin_id: i64,
		req: &UpdateAdminRequest,
	) -> Result<Admin, AppError> {
		check_self_update(owner_id, admin_id, req)?;
		let before = AdminRepo::find(conn, admin_id)?;
		let after = AdminRepo::update(
			conn,
			admin_id,
			&AdminChanges {
				name: req.name.as_deref().map(str::trim),
				role: req.role.map(|r| r.as_str()),
				status: req.status.map(|s| s.as_str()),
				updated_at: Some(Utc::now()),
			},
		)?;
		log::info!("Owner {} updated admin {}", owner_id, admin_id);
		trail.record(
			conn,
			AuditEntry::new(Actor::Admin(owner_id), AuditAction::Update, ENTITY_ADMIN, admin_id)
				.old(&before)
				.new_values(&after),
			200,
		);
		Ok(after)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn update(role: Option<AdminRole>, status: Option<AdminStatus>) -> UpdateAdminRequest {
		UpdateAdminRequest { name: None, role, status }
	}

	#[test]
	fn test_owner_cannot_lock_themselves_out() {
		assert!(check_self_update(1, 1, &update(None, None)).is_ok());
		assert!(check_self_update(1, 1, &update(Some(AdminRole::Super), Some(AdminStatus::Active))).is_ok());
		assert!(matches!(
			check_self_update(1, 1, &update(Some(AdminRole::Admin), None)),
			Err(AppError::ValidationFailed(_))
		));
		assert!(matches!(
			check_self_update(1, 1, &update(None, Some(AdminStatus::Blocked))),
			Err(AppError::ValidationFailed(_))
		));
		assert!(check_self_update(1, 2, &update(Some(AdminRole::Admin), Some(AdminStatus::Blocked))).is_ok());
	}
}
