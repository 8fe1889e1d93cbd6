use crate::{
	db::{self, DbPool},
	error::AppError,
	midware::context::{RequestContext, UserPrincipal},
	models::{
		dto::{AddBankAccountRequest, ProfileUpdate},
		ApiResponse,
	},
	services::{account::AccountService, audit::AuditTrail},
};
use actix_web::{web, HttpResponse};
use validator::Validate;

pub struct UserHandler {}

impl UserHandler {
	pub async fn get_profile_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
	) -> Result<HttpResponse, AppError> {
		let profile = db::run(pool, move |conn| AccountService::profile(conn, user.0.id)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(profile)))
	}

	pub async fn update_profile_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		ctx: RequestContext,
		body: web::Json<ProfileUpdate>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let req = body.into_inner();
		let profile = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			AccountService::update_profile(conn, &trail, user.0.id, &req)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(profile)))
	}

	pub async fn list_bank_accounts_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
	) -> Result<HttpResponse, AppError> {
		let accounts =
			db::run(pool, move |conn| AccountService::bank_accounts(conn, user.0.id)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(accounts)))
	}

	pub async fn add_bank_account_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		ctx: RequestContext,
		body: web::Json<AddBankAccountRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let req = body.into_inner();
		let account = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			AccountService::add_bank_account(conn, &trail, user.0.id, &req)
		})
		.await?;
		Ok(HttpResponse::Created().json(ApiResponse::created(account)))
	}
}
