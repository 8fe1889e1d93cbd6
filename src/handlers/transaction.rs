use crate::{
	db::{self, DbPool},
	error::AppError,
	midware::context::{RequestContext, UserPrincipal},
	models::{
		dto::{MoneyRequest, TransferRequest},
		ApiResponse, PageRequest,
	},
	services::{account::AccountService, audit::AuditTrail, ledger::LedgerEngine},
};
use actix_web::{web, HttpResponse};
use validator::Validate;

pub struct TransactionHandler {}

impl TransactionHandler {
	pub async fn topup_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		ctx: RequestContext,
		body: web::Json<MoneyRequest>,
	) -> Result<HttpResponse, AppError> {
		if body.amount < 1 {
			return Err(AppError::InvalidAmount);
		}
		body.validate()?;
		let req = body.into_inner();
		let txn = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			LedgerEngine::topup(conn, &trail, user.0.id, req.amount, req.description.as_deref())
		})
		.await?;
		Ok(HttpResponse::Created().json(ApiResponse::created(txn)))
	}

	pub async fn withdraw_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		ctx: RequestContext,
		body: web::Json<MoneyRequest>,
	) -> Result<HttpResponse, AppError> {
		if body.amount < 1 {
			return Err(AppError::InvalidAmount);
		}
		body.validate()?;
		let req = body.into_inner();
		let txn = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			LedgerEngine::withdraw(conn, &trail, user.0.id, req.amount, req.description.as_deref())
		})
		.await?;
		Ok(HttpResponse::Created().json(ApiResponse::created(txn)))
	}

	pub async fn transfer_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		ctx: RequestContext,
		body: web::Json<TransferRequest>,
	) -> Result<HttpResponse, AppError> {
		if body.amount < 1 {
			return Err(AppError::InvalidAmount);
		}
		body.validate()?;
		let req = body.into_inner();
		let receipt = db::run(pool, move |conn| {
			let trail = AuditTrail::new(ctx.audit());
			LedgerEngine::transfer(
				conn,
				&trail,
				user.0.id,
				req.to_account_number.trim(),
				req.amount,
				req.description.as_deref(),
			)
		})
		.await?;
		Ok(HttpResponse::Created().json(ApiResponse::created(receipt)))
	}

	pub async fn list_transactions_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		paging: web::Query<PageRequest>,
	) -> Result<HttpResponse, AppError> {
		let paging = paging.into_inner();
		let page =
			db::run(pool, move |conn| AccountService::transactions(conn, user.0.id, paging)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
	}

	pub async fn get_transaction_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
		path: web::Path<i64>,
	) -> Result<HttpResponse, AppError> {
		let transaction_id = path.into_inner();
		let txn = db::run(pool, move |conn| {
			AccountService::transaction(conn, user.0.id, transaction_id)
		})
		.await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(txn)))
	}

	pub async fn get_balance_handler(
		pool: web::Data<DbPool>,
		user: UserPrincipal,
	) -> Result<HttpResponse, AppError> {
		let profile = db::run(pool, move |conn| AccountService::profile(conn, user.0.id)).await?;
		Ok(HttpResponse::Ok().json(ApiResponse::ok(
			serde_json::json!({ "user_id": profile.id, "balance": profile.balance }),
		)))
	}
}
