use crate::{
	constants::{FORWARDED_FOR, REAL_IP, SESSION_HEADER},
	db::{self, DbPool},
	error::AppError,
	models::{Actor, UserRole},
	repo::SessionRepo,
	services::audit::AuditContext,
};
use actix_web::{
	dev::Payload, http::header::USER_AGENT, web, FromRequest, HttpMessage, HttpRequest,
};
use chrono::Utc;
use futures::future::{ready, LocalBoxFuture, Ready};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
	User,
	Admin,
}

/// The authenticated caller, stored once per request by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
	pub id: i64,
	pub kind: PrincipalKind,
	pub role: UserRole,
	pub session_id: Option<i64>,
}

impl Principal {
	pub fn actor(&self) -> Actor {
		match self.kind {
			PrincipalKind::User => Actor::User(self.id),
			PrincipalKind::Admin => Actor::Admin(self.id),
		}
	}
}

fn principal_of(req: &HttpRequest) -> Result<Principal, AppError> {
	req.extensions()
		.get::<Principal>()
		.copied()
		.ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

/// A customer principal.
#[derive(Debug, Clone, Copy)]
pub struct UserPrincipal(pub Principal);

/// An admin principal of any admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminPrincipal(pub Principal);

/// An admin principal holding the owner role.
#[derive(Debug, Clone, Copy)]
pub struct OwnerPrincipal(pub Principal);

pub fn require_user(p: Principal) -> Result<UserPrincipal, AppError> {
	match p.kind {
		PrincipalKind::User => Ok(UserPrincipal(p)),
		PrincipalKind::Admin => Err(AppError::Forbidden("Customer access only".to_string())),
	}
}

pub fn require_admin(p: Principal) -> Result<AdminPrincipal, AppError> {
	match p.kind {
		PrincipalKind::Admin => Ok(AdminPrincipal(p)),
		PrincipalKind::User => Err(AppError::Forbidden("Admin access required".to_string())),
	}
}

pub fn require_owner(p: Principal) -> Result<OwnerPrincipal, AppError> {
	let admin = require_admin(p)?.0;
	if admin.role == UserRole::Owner {
		Ok(OwnerPrincipal(admin))
	} else {
		Err(AppError::Forbidden("Owner access required".to_string()))
	}
}

fn session_closed() -> AppError {
	AppError::Unauthorized("Session is no longer active".to_string())
}

/// Customer tokens are only as good as the device session they were issued for.
impl FromRequest for UserPrincipal {
	type Error = AppError;
	type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

	fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
		let user = principal_of(req).and_then(require_user);
		let pool = req.app_data::<web::Data<DbPool>>().cloned();
		Box::pin(async move {
			let user = user?;
			let session_id = user.0.session_id.ok_or_else(session_closed)?;
			let pool = pool
				.ok_or_else(|| AppError::Internal("database pool is not configured".to_string()))?;
			let user_id = user.0.id;
			let live =
				db::run(pool, move |conn| SessionRepo::touch_live(conn, user_id, session_id, Utc::now()))
					.await?;
			if live {
				Ok(user)
			} else {
				Err(session_closed())
			}
		})
	}
}

impl FromRequest for AdminPrincipal {
	type Error = AppError;
	type Future = Ready<Result<Self, Self::Error>>;

	fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
		ready(principal_of(req).and_then(require_admin))
	}
}

impl FromRequest for OwnerPrincipal {
	type Error = AppError;
	type Future = Ready<Result<Self, Self::Error>>;

	fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
		ready(principal_of(req).and_then(require_owner))
	}
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`, then the socket peer.
pub fn resolve_client_ip(
	forwarded_for: Option<&str>,
	real_ip: Option<&str>,
	peer: Option<&str>,
) -> Option<String> {
	let first_hop = forwarded_for.and_then(|v| v.split(',').next()).map(str::trim);
	[first_hop, real_ip.map(str::trim), peer]
		.into_iter()
		.flatten()
		.find(|v| !v.is_empty())
		.map(str::to_string)
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
	req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Caller metadata for audit rows and session bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	pub endpoint: String,
	pub method: String,
	pub session_header: Option<String>,
}

impl RequestContext {
	pub fn capture(req: &HttpRequest) -> Self {
		let peer = req.peer_addr().map(|addr| addr.ip().to_string());
		Self {
			ip_address: resolve_client_ip(
				header(req, FORWARDED_FOR),
				header(req, REAL_IP),
				peer.as_deref(),
			),
			user_agent: header(req, USER_AGENT.as_str()).map(str::to_string),
			endpoint: req.path().to_string(),
			method: req.method().to_string(),
			session_header: header(req, SESSION_HEADER).map(str::to_string),
		}
	}

	pub fn audit(&self) -> AuditContext {
		AuditContext {
			ip_address: self.ip_address.clone(),
			user_agent: self.user_agent.clone(),
			api_endpoint: Some(self.endpoint.clone()),
			request_method: Some(self.method.clone()),
		}
	}
}

impl FromRequest for RequestContext {
	type Error = AppError;
	type Future = Ready<Result<Self, Self::Error>>;

	fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
		ready(Ok(RequestContext::capture(req)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::test::TestRequest;

	fn principal(kind: PrincipalKind, role: UserRole) -> Principal {
		Principal { id: 5, kind, role, session_id: None }
	}

	#[test]
	fn test_client_ip_order() {
		assert_eq!(
			resolve_client_ip(Some("203.0.113.9, 10.0.0.1"), Some("10.0.0.2"), Some("127.0.0.1"))
				.as_deref(),
			Some("203.0.113.9")
		);
		assert_eq!(
			resolve_client_ip(None, Some(" 10.0.0.2 "), Some("127.0.0.1")).as_deref(),
			Some("10.0.0.2")
		);
		assert_eq!(resolve_client_ip(Some(""), None, Some("127.0.0.1")).as_deref(), Some("127.0.0.1"));
		assert_eq!(resolve_client_ip(None, None, None), None);
	}

	#[test]
	fn test_role_gates() {
		assert!(require_user(principal(PrincipalKind::User, UserRole::User)).is_ok());
		assert!(matches!(
			require_user(principal(PrincipalKind::Admin, UserRole::Owner)),
			Err(AppError::Forbidden(_))
		));
		assert!(require_admin(principal(PrincipalKind::Admin, UserRole::Admin)).is_ok());
		assert!(matches!(
			require_owner(principal(PrincipalKind::Admin, UserRole::Admin)),
			Err(AppError::Forbidden(_))
		));
		assert!(matches!(
			require_owner(principal(PrincipalKind::User, UserRole::Owner)),
			Err(AppError::Forbidden(_))
		));
		assert!(require_owner(principal(PrincipalKind::Admin, UserRole::Owner)).is_ok());
	}

	#[test]
	fn test_request_context_reads_headers() {
		let req = TestRequest::post()
			.uri("/auth/logout-others")
			.insert_header((FORWARDED_FOR, "198.51.100.4"))
			.insert_header((SESSION_HEADER, "17"))
			.insert_header((USER_AGENT, "okhttp/4.12"))
			.to_http_request();
		let ctx = RequestContext::capture(&req);
		assert_eq!(ctx.ip_address.as_deref(), Some("198.51.100.4"));
		assert_eq!(ctx.session_header.as_deref(), Some("17"));
		assert_eq!(ctx.method, "POST");
		assert_eq!(ctx.audit().api_endpoint.as_deref(), Some("/auth/logout-others"));
	}

	#[actix_web::test]
	async fn test_customer_token_without_session_is_unauthorized() {
		let req = TestRequest::get().uri("/balance").to_http_request();
		req.extensions_mut().insert(principal(PrincipalKind::User, UserRole::User));
		let err = UserPrincipal::extract(&req).await.unwrap_err();
		assert!(matches!(err, AppError::Unauthorized(_)));

		// the role gate still answers first
		let req = TestRequest::get().uri("/balance").to_http_request();
		req.extensions_mut().insert(principal(PrincipalKind::Admin, UserRole::Owner));
		assert!(matches!(UserPrincipal::extract(&req).await, Err(AppError::Forbidden(_))));
	}

	#[test]
	fn test_missing_principal_is_unauthorized() {
		let req = TestRequest::get().to_http_request();
		assert!(matches!(principal_of(&req), Err(AppError::Unauthorized(_))));
	}
}
