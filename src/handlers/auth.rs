use crate::{
	db::{self, DbPool},
	error::AppError,
	midware::{
		context::{AdminPrincipal, RequestContext, UserPrincipal},
		jwt::JWT,
	},
	models::{
		dto::{AdminLoginRequest, ChangePinRequest, UserLoginRequest},
		ApiResponse,
	},
	services::{audit::AuditTrail, session::SessionService},
};
use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

pub struct AuthHandler {}

impl AuthHandler {
	pub async fn login_handler(
		pool: web::Data<DbPool>,
		jwt: web::Data<JWT>,
		ctx: RequestContext,
		body: web::Json<UserLoginRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let req = body.into_inner();
		log::info!("Login attempt for phone {} on {}", req.phone, req.device_type);
		let jwt = jwt.get_ref().clone();
		let resp = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			SessionService::user_login(conn, &trail, &jwt, &req)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(resp)))
	}

	pub async fn logout_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		ctx: RequestContext,
	) -> Result<HttpResponse, AppError> {
		db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			SessionService::logout(conn, &trail, &user.0)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::with_message(200, "Logged out", ())))
	}

	pub async fn logout_others_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		ctx: RequestContext,
	) -> Result<HttpResponse, AppError> {
		let closed = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			SessionService::logout_others(conn, &trail, &user.0, ctx.session_header.as_deref())
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "closed_sessions": closed }))))
	}

	pub async fn sessions_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
	) -> Result<HttpResponse, AppError> {
		let sessions =
			db::run(pool, move |conn| SessionService::list_sessions(conn, user.0.id)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(sessions)))
	}

	pub async fn change_pin_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		ctx: RequestContext,
		body: web::Json<ChangePinRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let req = body.into_inner();
		db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			SessionService::change_pin(conn, &trail, user.0.id, &req)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::with_message(200, "PIN updated", ())))
	}

	pub async fn admin_login_handler(
		pool: web::Data<DbPool>,
		jwt: web::Data<JWT>,
		ctx: RequestContext,
		body: web::Json<AdminLoginRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let req = body.into_inner();
		log::info!("Admin login attempt for {}", req.email);
		let jwt = jwt.get_ref().clone();
		let resp = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			SessionService::admin_login(conn, &trail, &jwt, &req)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(resp)))
	}

	pub async fn admin_logout_handler(
		pool: web::Data<DbPool>,
		admin: AdminPrincipal,
		ctx: RequestContext,
	) -> Result<HttpResponse, AppError> {
		db::run(pool, move |conn| {
			SessionService::admin_logout(conn, &AuditTrail::new(ctx.audit()), &admin.0);
			Ok(())
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::with_message(200, "Logged out", ())))
	}
}
