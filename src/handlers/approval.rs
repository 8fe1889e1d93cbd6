use crate::{
	db::{self, DbPool},
	error::AppError,
	midware::context::{AdminPrincipal, RequestContext},
	models::{
		dto::{
			BalanceChangeOutcome, BalanceChangeRequest, DecideRequest, StagePendingRequest,
			StageStatusChangeRequest, ThresholdListQuery, ThresholdUpsertRequest,
		},
		ApiResponse, PendingFilter, TransactionType,
	},
	services::{
		approval::ApprovalEngine, audit::AuditTrail, status_change::StatusChangeEngine,
		threshold::ThresholdPolicy,
	},
};
use actix_web::{web, HttpResponse};
use validator::Validate;

/// Maker-checker queues and the threshold policy behind them.
pub struct ApprovalHandler {}

impl ApprovalHandler {
	pub async fn submit_balance_change_handler(
		pool: web::Data<DbPool>,
		admin: AdminPrincipal,
		ctx: RequestContext,
		path: web::Path<i64>,
		body: web::Json<BalanceChangeRequest>,
	) -> Result<HttpResponse, AppError> {
		if body.amount < 1 {
			return Err(AppError::InvalidAmount);
		}
		body.validate()?;
		let user_id = path.into_inner();
		let req = body.into_inner();
		let outcome = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ApprovalEngine::submit(conn, &trail, admin.0.id, user_id, &req)
		})
		.await?;
		let message = match &outcome {
			BalanceChangeOutcome::Executed(_) => "Balance change executed",
			BalanceChangeOutcome::Staged(_) => "Balance change staged for approval",
		};
		Ok(HttpResponse::Created().json(ApiResponse::with_message(201, message, outcome)))
	}

	pub async fn stage_pending_handler(
		pool: web::Data<DbPool>,
		admin: AdminPrincipal,
		ctx: RequestContext,
		body: web::Json<StagePendingRequest>,
	) -> Result<HttpResponse, AppError> {
		if body.change.amount < 1 {
			return Err(AppError::InvalidAmount);
		}
		body.validate()?;
		let req = body.into_inner();
		let pending = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ApprovalEngine::stage(conn, &trail, admin.0.id, req.user_id, &req.change)
		})
		.await?;
		Ok(HttpResponse::Created().json(ApiResponse::created(pending)))
	}

	pub async fn list_pending_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		filter: web::Query<PendingFilter>,
	) -> Result<HttpResponse, AppError> {
		let filter = filter.into_inner();
		let page = db::run(pool, move |conn| ApprovalEngine::list(conn, &filter)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
	}

	pub async fn get_pending_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		path: web::Path<i64>,
	) -> Result<HttpResponse, AppError> {
		let pending_id = path.into_inner();
		let pending = db::run(pool, move |conn| ApprovalEngine::get(conn, pending_id)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(pending)))
	}

	pub async fn decide_pending_handler(
		pool: web::Data<DbPool>,
		admin: AdminPrincipal,
		ctx: RequestContext,
		path: web::Path<i64>,
		body: web::Json<DecideRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let pending_id = path.into_inner();
		let req = body.into_inner();
		let pending = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ApprovalEngine::decide(
				conn,
				&trail,
				pending_id,
				admin.0.id,
				req.action,
				req.comments.as_deref(),
				req.rejection_reason.as_deref(),
			)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(pending)))
	}

	pub async fn stage_status_change_handler(
		pool: web::Data<DbPool>,
		admin: AdminPrincipal,
		ctx: RequestContext,
		path: web::Path<i64>,
		body: web::Json<StageStatusChangeRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		if body.reason.trim().is_empty() {
			return Err(AppError::ValidationFailed("reason must not be blank".to_string()));
		}
		let user_id = path.into_inner();
		let req = body.into_inner();
		let change = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			StatusChangeEngine::stage(conn, &trail, admin.0.id, user_id, &req)
		})
		.await?;
		Ok(HttpResponse::Created().json(ApiResponse::created(change)))
	}

	pub async fn list_status_changes_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		filter: web::Query<PendingFilter>,
	) -> Result<HttpResponse, AppError> {
		let filter = filter.into_inner();
		let page = db::run(pool, move |conn| StatusChangeEngine::list(conn, &filter)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
	}

	pub async fn get_status_change_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		path: web::Path<i64>,
	) -> Result<HttpResponse, AppError> {
		let change_id = path.into_inner();
		let change = db::run(pool, move |conn| StatusChangeEngine::get(conn, change_id)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(change)))
	}

	pub async fn decide_status_change_handler(
		pool: web::Data<DbPool>,
		admin: AdminPrincipal,
		ctx: RequestContext,
		path: web::Path<i64>,
		body: web::Json<DecideRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let change_id = path.into_inner();
		let req = body.into_inner();
		let change = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			StatusChangeEngine::decide(
				conn,
				&trail,
				change_id,
				admin.0.id,
				req.action,
				req.comments.as_deref(),
				req.rejection_reason.as_deref(),
			)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(change)))
	}

	pub async fn list_thresholds_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		query: web::Query<ThresholdListQuery>,
	) -> Result<HttpResponse, AppError> {
		let active_only = query.active_only.unwrap_or(false);
		let thresholds =
			db::run(pool, move |conn| ThresholdPolicy::get_all(conn, active_only)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(thresholds)))
	}

	pub async fn get_threshold_handler(
		pool: web::Data<DbPool>,
		_admin: AdminPrincipal,
		path: web::Path<String>,
	) -> Result<HttpResponse, AppError> {
		let kind: TransactionType = path.into_inner().parse()?;
		let threshold = db::run(pool, move |conn| ThresholdPolicy::get(conn, kind)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(threshold)))
	}

	pub async fn upsert_threshold_handler(
		pool: web::Data<DbPool>,
		admin: AdminPrincipal,
		ctx: RequestContext,
		body: web::Json<ThresholdUpsertRequest>,
	) -> Result<HttpResponse, AppError> {
		body.validate()?;
		let req = body.into_inner();
		let threshold = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ThresholdPolicy::upsert(conn, &trail, admin.0.id, &req)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(threshold)))
	}

	pub async fn deactivate_threshold_handler(
		pool: web::Data<DbPool>,
		admin: AdminPrincipal,
		ctx: RequestContext,
		path: web::Path<i64>,
	) -> Result<HttpResponse, AppError> {
		let threshold_id = path.into_inner();
		let threshold = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			ThresholdPolicy::deactivate(conn, &trail, admin.0.id, threshold_id)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(threshold)))
	}
}
