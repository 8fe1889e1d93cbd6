use crate::{
	db::{self, DbPool},
	error::AppError,
	midware::context::{AdminPrincipal, OwnerPrincipal, RequestContext},
	models::{
		dto::{
			CreateAdminRequest, CreateUserRequest, UpdateAdminRequest, UpdateUserRequest,
			UserListQuery,
		},
		ApiResponse, AuditFilter, LoginAuditFilter, PageRequest,
	},
	services::{
		audit::{query_logins, query_logs, AuditTrail},
		dashboard,
		management::ManagementService,
	},
};
use actix_web::{web, HttpResponse};
use validator::Validate;

pub struct AdminHandler {}

impl AdminHandler {
	pub async fn list_users_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		query: web::Query<UserListQuery>,
	) -> Result<HttpResponse, AppError> {
		let query = query.into_inner();
		let page = db::run(pool, move |conn| ManagementService::list_users(conn, &query)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
	}

	pub async fn get_user_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		path: web::Path<i64>,
	) -> Result<HttpResponse, AppError> {
		let user_id = path.into_inner();
		let user = db::run(pool, move |conn| ManagementService::get_user(conn, user_id)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
	}

	pub async fn user_transactions_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		path: web::Path<i64>,
		paging: web::Query<PageRequest>,
	) -> Result<HttpResponse, AppError> {
		let user_id = path.into_inner();
		let paging = paging.into_inner();
		let page = db::run(pool, move |conn| {
			ManagementService::user_transactions(conn, user_id, paging)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
	}

	pub async fn create_user_handler(
		pool: web::Data<DbPool>,
		owner: OwnerPrincipal,
		ctx: RequestContext,
		body: web::Json<CreateUserRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let req = body.into_inner();
		let user = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ManagementService::create_user(conn, &trail, owner.0.id, &req)
		})
		.await?;
		Ok(HttpResponse::Created().json(ApiResponse::created(user)))
	}

	pub async fn update_user_handler(
		pool: web::Data<DbPool>,
		owner: OwnerPrincipal,
		ctx: RequestContext,
		path: web::Path<i64>,
		body: web::Json<UpdateUserRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let user_id = path.into_inner();
		let req = body.into_inner();
		let user = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ManagementService::update_user(conn, &trail, owner.0.id, user_id, &req)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
	}

	pub async fn list_admins_handler(
		pool: web::Data<DbPool>,
		_owner: OwnerPrincipal,
		paging: web::Query<PageRequest>,
	) -> Result<HttpResponse, AppError> {
		let paging = paging.into_inner();
		let page = db::run(pool, move |conn| ManagementService::list_admins(conn, paging)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
	}

	pub async fn get_admin_handler(
		pool: web::Data<DbPool>,
		_owner: OwnerPrincipal,
		path: web::Path<i64>,
	) -> Result<HttpResponse, AppError> {
		let admin_id = path.into_inner();
		let admin = db::run(pool, move |conn| ManagementService::get_admin(conn, admin_id)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(admin)))
	}

	pub async fn create_admin_handler(
		pool: web::Data<DbPool>,
		owner: OwnerPrincipal,
		ctx: RequestContext,
		body: web::Json<CreateAdminRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let req = body.into_inner();
		let admin = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ManagementService::create_admin(conn, &trail, owner.0.id, &req)
		})
		.await?;
		Ok(HttpResponse::Created().json(ApiResponse::created(admin)))
	}

	pub async fn update_admin_handler(
		pool: web::Data<DbPool>,
		owner: OwnerPrincipal,
		ctx: RequestContext,
		path: web::Path<i64>,
		body: web::Json<UpdateAdminRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let admin_id = path.into_inner();
		let req = body.into_inner();
		let admin = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ManagementService::update_admin(conn, &trail, owner.0.id, admin_id, &req)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(admin)))
	}

	pub async fn dashboard_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
	) -> Result<HttpResponse, AppError> {
		let summary = db::run(pool, |conn| dashboard::summary(conn)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(summary)))
	}

	pub async fn audit_logs_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		filter: web::Query<AuditFilter>,
	) -> Result<HttpResponse, AppError> {
		let filter = filter.into_inner();
		let page = db::run(pool, move |conn| query_logs(conn, &filter)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
	}

	pub async fn login_audits_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		filter: web::Query<LoginAuditFilter>,
	) -> Result<HttpResponse, AppError> {
		let filter = filter.into_inner();
		let page = db::run(pool, move |conn| query_logins(conn, &filter)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
	}
}
