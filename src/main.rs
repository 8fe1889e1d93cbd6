mod admin_routes;
mod config;
mod constants;
mod db;
mod error;
mod handlers;
mod midware;
mod models;
mod repo;
mod schema;
mod services;
#[cfg(test)]
mod tests;
mod transaction_routes;
mod user_routes;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use config::Config;
use dotenv::dotenv;
use env_logger::Env;
use midware::jwt::{Authentication, JWT};
use std::time::Duration;

/// Every route of the service; the auth middleware is applied by the caller.
pub fn routes(cfg: &mut web::ServiceConfig) {
	cfg.route("/health", web::get().to(handlers::health_handler));
	user_routes::init(cfg);
	transaction_routes::init(cfg);
	admin_routes::init(cfg);
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	dotenv().ok();
	env_logger::init_from_env(Env::default().default_filter_or("info"));
	let config = Config::parse();
	log::debug!("Starting with {:?}", config);

	let pool = db::get_db_pool(&config.database_url(), config.db_pool_size)?;
	db::init(&pool).context("unable to initialize the db")?;

	if config.expiry_sweep_secs > 0 {
		services::sweeper::spawn(pool.clone(), Duration::from_secs(config.expiry_sweep_secs));
	} else {
		log::info!("Expiry sweeper disabled");
	}

	let jwt = JWT::new(&config.jwt_secret);
	let (host, port) = config.bind_addr();
	log::info!("Listening on: {}:{}..", host, port);

	HttpServer::new(move || {
		App::new()
			.app_data(web::Data::new(pool.clone()))
			.app_data(web::Data::new(jwt.clone()))
			.wrap(Authentication::new(jwt.clone()))
			.wrap(
				Cors::default()
					.allow_any_origin()
					.allow_any_method()
					.allow_any_header()
					.max_age(3600),
			)
			.wrap(actix_web::middleware::Logger::default())
			.configure(routes)
	})
	.workers(num_cpus::get())
	.bind((host, port))?
	.run()
	.await?;
	Ok(())
}
