use super::audit::{AuditEntry, AuditTrail};
use crate::{
	constants::{
		ADMIN_TOKEN_TTL, ENTITY_ADMIN, ENTITY_SESSION, ENTITY_USER, REFRESH_TOKEN_LEN,
		USER_TOKEN_TTL,
	},
	error::AppError,
	midware::{
		context::{Principal, PrincipalKind},
		jwt::JWT,
	},
	models::{
		dto::{AdminLoginRequest, ChangePinRequest, LoginResp, UserLoginRequest},
		Actor, Admin, AdminRole, AdminStatus, AuditAction, DeviceSession, LoginStatus, LoginType,
		NewDeviceSession, UserRole, UserStatus,
	},
	repo::{AdminRepo, SessionRepo, UserRepo},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, TimeZone, Utc};
use diesel::prelude::*;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use uuid::Uuid;

const INVALID_USER_CREDENTIALS: &str = "Invalid phone number or PIN";
const INVALID_ADMIN_CREDENTIALS: &str = "Invalid email or password";

pub fn refresh_token() -> String {
	rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(REFRESH_TOKEN_LEN)
		.map(char::from)
		.collect()
}

/// Token role for an admin account; `super` admins act as owners.
pub fn admin_principal_role(role: AdminRole) -> UserRole {
	match role {
		AdminRole::Admin => UserRole::Admin,
		AdminRole::Super => UserRole::Owner,
	}
}

fn expiry_of(exp: usize) -> DateTime<Utc> {
	Utc.timestamp_opt(exp as i64, 0).single().unwrap_or_else(Utc::now)
}

pub struct SessionService;

impl SessionService {
	pub fn user_login(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		jwt: &JWT,
		req: &UserLoginRequest,
	) -> Result<LoginResp, AppError> {
		let denied =
			|conn: &mut PgConnection, actor: Option<Actor>, status: LoginStatus, reason: &str| {
				trail.record_login(conn, actor, LoginType::UserPin, status, Some(reason));
			};

		let user = match UserRepo::find_by_phone(conn, &req.phone)? {
			Some(user) => user,
			None => {
				denied(conn, None, LoginStatus::Failed, "unknown phone number");
				return Err(AppError::Unauthorized(INVALID_USER_CREDENTIALS.to_string()));
			},
		};
		let actor = Some(Actor::User(user.id));
		match user.status()? {
			UserStatus::Blocked => {
				denied(conn, actor, LoginStatus::Blocked, "account blocked");
				return Err(AppError::Forbidden("Account is blocked".to_string()));
			},
			UserStatus::Inactive => {
				denied(conn, actor, LoginStatus::Failed, "account inactive");
				return Err(AppError::Forbidden("Account is inactive".to_string()));
			},
			UserStatus::Active => {},
		}
		if !verify(&req.pin, &user.pin_hash)? {
			denied(conn, actor, LoginStatus::Failed, "invalid pin");
			return Err(AppError::Unauthorized(INVALID_USER_CREDENTIALS.to_string()));
		}

		let now = Utc::now();
		let ctx = trail.context();
		let created = conn.transaction::<_, AppError, _>(|conn| {
			// serialises concurrent logins of the same customer
			UserRepo::lock_active(conn, user.id)?;
			let duplicate = SessionRepo::find_active_for_device(
				conn,
				user.id,
				&req.device_type,
				&req.device_id,
				&req.device_name,
				now,
			)?;
			if duplicate.is_some() {
				return Err(AppError::Conflict(
					"An active session already exists for this device".to_string(),
				));
			}
			let session_token = Uuid::new_v4().simple().to_string();
			let refresh = refresh_token();
			SessionRepo::insert(
				conn,
				&NewDeviceSession {
					user_id: user.id,
					session_token: &session_token,
					refresh_token: &refresh,
					device_type: &req.device_type,
					device_id: &req.device_id,
					device_name: &req.device_name,
					ip_address: ctx.ip_address.as_deref(),
					user_agent: ctx.user_agent.as_deref(),
					expires_at: now + Duration::seconds(USER_TOKEN_TTL as i64),
				},
			)
		});
		let session = match created {
			Ok(session) => session,
			Err(e) => {
				if matches!(e, AppError::Conflict(_)) {
					denied(conn, actor, LoginStatus::Failed, "duplicate device session");
				}
				return Err(e);
			},
		};

		let principal = Principal {
			id: user.id,
			kind: PrincipalKind::User,
			role: user.role.parse()?,
			session_id: Some(session.id),
		};
		let (token, exp) = jwt.create_jwt(&principal, USER_TOKEN_TTL)?;
		log::info!("User {} logged in on {} ({})", user.id, req.device_name, session.id);
		trail.record_login(conn, actor, LoginType::UserPin, LoginStatus::Success, None);
		Ok(LoginResp {
			uid: user.id.to_string(),
			token,
			session_id: Some(session.id),
			expires_at: expiry_of(exp),
		})
	}

	pub fn list_sessions(
		conn: &mut PgConnection,
		user_id: i64,
	) -> Result<Vec<DeviceSession>, AppError> {
		SessionRepo::list_active(conn, user_id, Utc::now())
	}

	pub fn logout(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		principal: &Principal,
	) -> Result<(), AppError> {
		if let Some(session_id) = principal.session_id {
			let closed = SessionRepo::deactivate(conn, principal.id, session_id)?;
			log::info!("User {} logged out of session {} ({} closed)", principal.id, session_id, closed);
			trail.record(
				conn,
				AuditEntry::new(principal.actor(), AuditAction::Logout, ENTITY_SESSION, session_id)
					.old(&json!({ "is_active": true }))
					.new_values(&json!({ "is_active": false })),
				200,
			);
		}
		trail.record_login(
			conn,
			Some(principal.actor()),
			LoginType::Logout,
			LoginStatus::Success,
			None,
		);
		Ok(())
	}

	/// Closes every session of the caller except `keep`, which must be one of theirs and active.
	pub fn logout_others(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		principal: &Principal,
		keep: Option<&str>,
	) -> Result<usize, AppError> {
		let keep_id = keep
			.and_then(|v| v.trim().parse::<i64>().ok())
			.ok_or_else(|| AppError::ValidationFailed("X-Session-ID header is required".to_string()))?;
		let active = SessionRepo::list_active(conn, principal.id, Utc::now())?;
		if !active.iter().any(|s| s.id == keep_id) {
			return Err(AppError::NotFound("Session"));
		}
		let closed = SessionRepo::deactivate_others(conn, principal.id, keep_id)?;
		log::info!("User {} closed {} other sessions, kept {}", principal.id, closed, keep_id);
		trail.record(
			conn,
			AuditEntry::new(principal.actor(), AuditAction::Logout, ENTITY_SESSION, keep_id)
				.old(&json!({ "active_sessions": active.len() }))
				.new_values(&json!({ "active_sessions": active.len() - closed.min(active.len()) })),
			200,
		);
		Ok(closed)
	}

	pub fn change_pin(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		user_id: i64,
		req: &ChangePinRequest,
	) -> Result<(), AppError> {
		let user = UserRepo::find_active(conn, user_id)?;
		if !verify(&req.old_pin, &user.pin_hash)? {
			return Err(AppError::Unauthorized("Current PIN is incorrect".to_string()));
		}
		let pin_hash = hash(&req.new_pin, DEFAULT_COST)?;
		let now = Utc::now();
		UserRepo::set_pin_hash(conn, user_id, &pin_hash, now)?;
		log::info!("User {} changed PIN", user_id);
		trail.record(
			conn,
			AuditEntry::new(Actor::User(user_id), AuditAction::Update, ENTITY_USER, user_id)
				.old(&json!({ "pin": "***", "updated_at": user.updated_at }))
				.new_values(&json!({ "pin": "***", "updated_at": now })),
			200,
		);
		Ok(())
	}

	pub fn admin_login(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		jwt: &JWT,
		req: &AdminLoginRequest,
	) -> Result<LoginResp, AppError> {
		let denied =
			|conn: &mut PgConnection, actor: Option<Actor>, status: LoginStatus, reason: &str| {
				trail.record_login(conn, actor, LoginType::AdminPassword, status, Some(reason));
			};

		let admin: Admin = match AdminRepo::find_by_email(conn, &req.email)? {
			Some(admin) => admin,
			None => {
				denied(conn, None, LoginStatus::Failed, "unknown email");
				return Err(AppError::Unauthorized(INVALID_ADMIN_CREDENTIALS.to_string()));
			},
		};
		let actor = Some(Actor::Admin(admin.id));
		match admin.status.parse::<AdminStatus>()? {
			AdminStatus::Blocked => {
				denied(conn, actor, LoginStatus::Blocked, "account blocked");
				return Err(AppError::Forbidden("Account is blocked".to_string()));
			},
			AdminStatus::Inactive => {
				denied(conn, actor, LoginStatus::Failed, "account inactive");
				return Err(AppError::Forbidden("Account is inactive".to_string()));
			},
			AdminStatus::Active => {},
		}
		if !verify(&req.password, &admin.password_hash)? {
			denied(conn, actor, LoginStatus::Failed, "invalid password");
			return Err(AppError::Unauthorized(INVALID_ADMIN_CREDENTIALS.to_string()));
		}

		AdminRepo::touch_last_login(conn, admin.id, Utc::now())?;
		let principal = Principal {
			id: admin.id,
			kind: PrincipalKind::Admin,
			role: admin_principal_role(admin.role.parse()?),
			session_id: None,
		};
		let (token, exp) = jwt.create_jwt(&principal, ADMIN_TOKEN_TTL)?;
		log::info!("Admin {} logged in", admin.id);
		trail.record_login(conn, actor, LoginType::AdminPassword, LoginStatus::Success, None);
		Ok(LoginResp { uid: admin.id.to_string(), token, session_id: None, expires_at: expiry_of(exp) })
	}

	pub fn admin_logout(conn: &mut PgConnection, trail: &AuditTrail, principal: &Principal) {
		log::info!("Admin {} logged out", principal.id);
		trail.record(
			conn,
			AuditEntry::new(principal.actor(), AuditAction::Logout, ENTITY_ADMIN, principal.id),
			200,
		);
		trail.record_login(
			conn,
			Some(principal.actor()),
			LoginType::Logout,
			LoginStatus::Success,
			None,
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_refresh_tokens_are_random_and_sized() {
		let a = refresh_token();
		let b = refresh_token();
		assert_eq!(a.len(), REFRESH_TOKEN_LEN);
		assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(a, b);
	}

	#[test]
	fn test_super_admins_act_as_owner() {
		assert_eq!(admin_principal_role(AdminRole::Super), UserRole::Owner);
		assert_eq!(admin_principal_role(AdminRole::Admin), UserRole::Admin);
	}

	#[test]
	fn test_expiry_conversion() {
		assert_eq!(expiry_of(0), Utc.timestamp_opt(0, 0).unwrap());
	}
}
