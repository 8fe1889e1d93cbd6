use crate::{
	db::DbPool,
	error::AppError,
	repo::{PendingTransactionRepo, StatusChangeRepo},
};
use actix_web::web;
use chrono::{DateTime, Utc};
use diesel::PgConnection;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
	pub balance_changes: usize,
	pub status_changes: usize,
}

/// Marks every overdue pending request expired.
pub fn sweep(conn: &mut PgConnection, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
	Ok(SweepReport {
		balance_changes: PendingTransactionRepo::expire_stale(conn, now)?,
		status_changes: StatusChangeRepo::expire_stale(conn, now)?,
	})
}

async fn run_once(pool: DbPool) -> Result<SweepReport, AppError> {
	web::block(move || {
		let mut conn = pool.get()?;
		sweep(&mut conn, Utc::now())
	})
	.await?
}

/// Runs [`sweep`] every `every` on the current actix system.
pub fn spawn(pool: DbPool, every: Duration) {
	actix_rt::spawn(async move {
		let mut ticker = actix_rt::time::interval(every);
		loop {
			ticker.tick().await;
			match run_once(pool.clone()).await {
				Ok(report) if report.balance_changes + report.status_changes > 0 => log::info!(
					"Expiry sweep closed {} balance changes and {} status changes",
					report.balance_changes,
					report.status_changes
				),
				Ok(_) => log::debug!("Expiry sweep found nothing overdue"),
				Err(e) => log::error!("Expiry sweep failed: {}", e),
			}
		}
	});
}
