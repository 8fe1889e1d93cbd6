use crate::error::AppError;
use actix_web::web;
use anyhow::{anyhow, Context};
use diesel::{
	prelude::*,
	r2d2::{self, ConnectionManager},
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn get_db_pool(database_url: &str, max_size: u32) -> anyhow::Result<DbPool> {
	let manager = ConnectionManager::<PgConnection>::new(database_url);
	r2d2::Pool::builder()
		.max_size(max_size.max(2))
		.build(manager)
		.context("failed to create database pool")
}

/// Applies every embedded migration that has not run yet.
pub fn init(pool: &DbPool) -> anyhow::Result<()> {
	let mut conn = pool.get().context("can not get a connection from the pool")?;
	let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
	for version in applied {
		log::info!("Applied migration {}", version);
	}
	Ok(())
}

/// Runs blocking diesel work on the actix blocking pool with one pooled connection.
pub async fn run<F, T>(pool: web::Data<DbPool>, f: F) -> Result<T, AppError>
where
	F: FnOnce(&mut PgConnection) -> Result<T, AppError> + Send + 'static,
	T: Send + 'static,
{
	web::block(move || {
		let mut conn = pool.get()?;
		f(&mut conn)
	})
	.await?
}
