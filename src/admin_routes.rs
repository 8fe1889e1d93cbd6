use crate::handlers::{AdminHandler, ApprovalHandler, AuthHandler};
use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
	cfg.service(
		web::scope("/admin")
			.route("/auth/login", web::post().to(AuthHandler::admin_login_handler))
			.route("/auth/logout", web::post().to(AuthHandler::admin_logout_handler))
			// customers
			.route("/users", web::get().to(AdminHandler::list_users_handler))
			.route("/users", web::post().to(AdminHandler::create_user_handler))
			.route("/users/{id}", web::get().to(AdminHandler::get_user_handler))
			.route("/users/{id}", web::put().to(AdminHandler::update_user_handler))
			.route("/users/{id}/transactions", web::get().to(AdminHandler::user_transactions_handler))
			.route(
				"/users/{id}/balance-changes",
				web::post().to(ApprovalHandler::submit_balance_change_handler),
			)
			.route(
				"/users/{id}/status-changes",
				web::post().to(ApprovalHandler::stage_status_change_handler),
			)
			// admins
			.route("/admins", web::get().to(AdminHandler::list_admins_handler))
			.route("/admins", web::post().to(AdminHandler::create_admin_handler))
			.route("/admins/{id}", web::get().to(AdminHandler::get_admin_handler))
			.route("/admins/{id}", web::put().to(AdminHandler::update_admin_handler))
			// maker-checker
			.route("/pending-transactions", web::get().to(ApprovalHandler::list_pending_handler))
			.route("/pending-transactions", web::post().to(ApprovalHandler::stage_pending_handler))
			.route("/pending-transactions/{id}", web::get().to(ApprovalHandler::get_pending_handler))
			.route(
				"/pending-transactions/{id}/decide",
				web::post().to(ApprovalHandler::decide_pending_handler),
			)
			.route("/status-changes", web::get().to(ApprovalHandler::list_status_changes_handler))
			.route("/status-changes/{id}", web::get().to(ApprovalHandler::get_status_change_handler))
			.route(
				"/status-changes/{id}/decide",
				web::post().to(ApprovalHandler::decide_status_change_handler),
			)
			// thresholds
			.route("/thresholds", web::get().to(ApprovalHandler::list_thresholds_handler))
			.route("/thresholds", web::put().to(ApprovalHandler::upsert_threshold_handler))
			.route("/thresholds/{transaction_type}", web::get().to(ApprovalHandler::get_threshold_handler))
			.route(
				"/thresholds/{id}/deactivate",
				web::post().to(ApprovalHandler::deactivate_threshold_handler),
			)
			// reporting
			.route("/dashboard", web::get().to(AdminHandler::dashboard_handler))
			.route("/audit-logs", web::get().to(AdminHandler::audit_logs_handler))
			.route("/login-audits", web::get().to(AdminHandler::login_audits_handler)),
	);
}
