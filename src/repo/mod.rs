pub mod admin_repo;
pub mod audit_repo;
pub mod bank_account_repo;
pub mod dashboard_repo;
pub mod pending_repo;
pub mod session_repo;
pub mod status_change_repo;
pub mod threshold_repo;
pub mod transaction_repo;
pub mod user_repo;

pub use admin_repo::AdminRepo;
pub use audit_repo::AuditRepo;
pub use bank_account_repo::BankAccountRepo;
pub use dashboard_repo::DashboardRepo;
pub use pending_repo::PendingTransactionRepo;
pub use session_repo::SessionRepo;
pub use status_change_repo::StatusChangeRepo;
pub use threshold_repo::ThresholdRepo;
pub use transaction_repo::TransactionRepo;
pub use user_repo::UserRepo;

use crate::error::AppError;
use chrono::{DateTime, Days, NaiveDate, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Turns a unique-index collision into `Conflict` with a readable message.
pub(crate) fn unique_as_conflict(err: DieselError, message: &str) -> AppError {
	match err {
		DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) =>
			AppError::Conflict(message.to_string()),
		other => AppError::Store(other),
	}
}

pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
	date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

/// Exclusive upper bound for an inclusive `date_to` filter.
pub(crate) fn day_after(date: NaiveDate) -> DateTime<Utc> {
	day_start(date.checked_add_days(Days::new(1)).unwrap_or(date))
}
