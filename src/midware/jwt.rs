use super::context::{Principal, PrincipalKind};
use crate::{
	constants::{AUTHORIZATION, IGNORE_ROUTES, MESSAGE_INVALID_TOKEN},
	error::AppError,
	models::{ApiResponse, UserRole},
};
use actix_service::forward_ready;
use actix_web::{
	body::EitherBody,
	dev::{Service, ServiceRequest, ServiceResponse, Transform},
	http::{header::Header as _, Method, StatusCode},
	Error as AxError, HttpMessage, HttpResponse,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use chrono::Utc;
use futures::future::{ok, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, encode, errors::Error, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
	pub iat: usize,
	pub exp: usize,
	pub sub: String,
	pub kind: PrincipalKind,
	pub role: UserRole,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sid: Option<i64>,
}

impl Claims {
	pub fn principal(&self) -> Result<Principal, AppError> {
		let id = self
			.sub
			.parse::<i64>()
			.map_err(|_| AppError::Unauthorized(MESSAGE_INVALID_TOKEN.to_string()))?;
		Ok(Principal { id, kind: self.kind, role: self.role, session_id: self.sid })
	}
}

#[derive(Clone)]
pub struct JWT {
	secret: String,
}

impl JWT {
	pub fn new(s: &str) -> Self {
		Self { secret: s.to_string() }
	}

	/// Signs a token for `principal` valid for `ttl` seconds; returns the token and its expiry.
	pub fn create_jwt(&self, principal: &Principal, ttl: usize) -> Result<(String, usize), Error> {
		let now = Utc::now().timestamp().max(0) as usize;
		let expiry = now + ttl;
		let claims = Claims {
			iat: now,
			exp: expiry,
			sub: principal.id.to_string(),
			kind: principal.kind,
			role: principal.role,
			sid: principal.session_id,
		};
		debug!("Issuing token for {:?} {} until {}", claims.kind, claims.sub, expiry);
		let token =
			encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_ref()))?;
		Ok((token, expiry))
	}

	pub fn verify_jwt(&self, token: &str) -> Result<Claims, Error> {
		decode::<Claims>(
			token,
			&DecodingKey::from_secret(self.secret.as_ref()),
			&Validation::default(),
		)
		.map(|data| data.claims)
	}
}

fn is_public(method: &Method, path: &str) -> bool {
	*method == Method::OPTIONS || IGNORE_ROUTES.iter().any(|route| path == *route)
}

/// Verifies the bearer token on every non-public route and stores the [`Principal`].
pub struct Authentication {
	jwt: JWT,
}

impl Authentication {
	pub fn new(jwt: JWT) -> Self {
		Self { jwt }
	}
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
	S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = AxError>,
	S::Future: 'static,
	B: 'static,
{
	type Response = ServiceResponse<EitherBody<B>>;
	type Error = AxError;
	type InitError = ();
	type Transform = AuthenticationMiddleware<S>;
	type Future = Ready<Result<Self::Transform, Self::InitError>>;

	fn new_transform(&self, service: S) -> Self::Future {
		ok(AuthenticationMiddleware { jwt: self.jwt.clone(), service })
	}
}

pub struct AuthenticationMiddleware<S> {
	jwt: JWT,
	service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
	S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = AxError>,
	S::Future: 'static,
	B: 'static,
{
	type Response = ServiceResponse<EitherBody<B>>;
	type Error = AxError;
	type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

	forward_ready!(service);

	fn call(&self, req: ServiceRequest) -> Self::Future {
		if is_public(req.method(), req.path()) {
			let res = self.service.call(req);
			return Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) });
		}

		let principal = match Authorization::<Bearer>::parse(&req) {
			Ok(auth) => match self.jwt.verify_jwt(auth.into_scheme().token()) {
				Ok(claims) => claims.principal().ok(),
				Err(e) => {
					warn!("Rejected token on {}: {}", req.path(), e);
					None
				},
			},
			Err(_) => {
				debug!("No bearer {} header on {}", AUTHORIZATION, req.path());
				None
			},
		};

		match principal {
			Some(principal) => {
				req.extensions_mut().insert(principal);
				let res = self.service.call(req);
				Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) })
			},
			None => {
				let (request, _pl) = req.into_parts();
				let response = HttpResponse::build(StatusCode::UNAUTHORIZED)
					.json(ApiResponse::<()>::error(401, MESSAGE_INVALID_TOKEN))
					.map_into_right_body();
				Box::pin(async { Ok(ServiceResponse::new(request, response)) })
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn admin() -> Principal {
		Principal { id: 42, kind: PrincipalKind::Admin, role: UserRole::Owner, session_id: None }
	}

	#[test]
	fn test_token_round_trip_keeps_principal() {
		let jwt = JWT::new("test_secret");
		let (token, exp) = jwt.create_jwt(&admin(), 3600).unwrap();
		let claims = jwt.verify_jwt(&token).unwrap();
		assert_eq!(claims.exp, exp);
		assert_eq!(claims.principal().unwrap(), admin());
	}

	#[test]
	fn test_foreign_secret_is_rejected() {
		let (token, _) = JWT::new("one").create_jwt(&admin(), 3600).unwrap();
		assert!(JWT::new("two").verify_jwt(&token).is_err());
	}

	#[test]
	fn test_public_routes() {
		assert!(is_public(&Method::POST, "/auth/login"));
		assert!(is_public(&Method::GET, "/health"));
		assert!(is_public(&Method::OPTIONS, "/transactions"));
		assert!(!is_public(&Method::POST, "/auth/logout"));
		assert!(!is_public(&Method::POST, "/admin/auth/logout"));
	}
}
