use crate::handlers::TransactionHandler;
use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
	cfg
		// money movement
		.route("/transactions/topup", web::post().to(TransactionHandler::topup_handler))
		.route("/transactions/withdraw", web::post().to(TransactionHandler::withdraw_handler))
		.route("/transactions/transfer", web::post().to(TransactionHandler::transfer_handler))
		// history
		.route("/transactions", web::get().to(TransactionHandler::list_transactions_handler))
		.route("/transactions/{id}", web::get().to(TransactionHandler::get_transaction_handler))
		.route("/balance", web::get().to(TransactionHandler::get_balance_handler));
}
