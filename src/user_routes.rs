use crate::handlers::{AuthHandler, UserHandler};
use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
	cfg
		// sessions
		.route("/auth/login", web::post().to(AuthHandler::login_handler))
		.route("/auth/logout", web::post().to(AuthHandler::logout_handler))
		.route("/auth/logout-others", web::post().to(AuthHandler::logout_others_handler))
		.route("/sessions", web::get().to(AuthHandler::sessions_handler))
		// profile
		.route("/profile", web::get().to(UserHandler::get_profile_handler))
		.route("/profile", web::put().to(UserHandler::update_profile_handler))
		.route("/profile/pin", web::put().to(AuthHandler::change_pin_handler))
		// bank accounts
		.route("/bank-accounts", web::get().to(UserHandler::list_bank_accounts_handler))
		.route("/bank-accounts", web::post().to(UserHandler::add_bank_account_handler));
}
