use crate::{
	error::AppError,
	models::{dto::DecisionAction, PendingStatus, PendingTransaction, PendingUserStatusChange},
};
use chrono::{DateTime, Utc};

/// A maker-checker record awaiting a decision.
pub trait Decidable {
	fn status(&self) -> &str;
	fn maker_admin_id(&self) -> i64;
	fn expires_at(&self) -> DateTime<Utc>;

	fn is_overdue(&self, now: DateTime<Utc>) -> bool {
		self.status() == PendingStatus::Pending.as_str() && self.expires_at() < now
	}
}

impl Decidable for PendingTransaction {
	fn status(&self) -> &str {
		&self.status
	}

	fn maker_admin_id(&self) -> i64 {
		self.maker_admin_id
	}

	fn expires_at(&self) -> DateTime<Utc> {
		self.expires_at
	}
}

impl Decidable for PendingUserStatusChange {
	fn status(&self) -> &str {
		&self.status
	}

	fn maker_admin_id(&self) -> i64 {
		self.maker_admin_id
	}

	fn expires_at(&self) -> DateTime<Utc> {
		self.expires_at
	}
}

#[derive(Debug, PartialEq, Eq)]
pub enum Precheck {
	Proceed,
	/// Past its deadline: the caller must persist `expired` and then fail.
	Expire,
}

/// Order matters: terminal state, then expiry, then segregation of duties.
pub fn precheck<D: Decidable>(
	record: &D,
	checker_admin_id: i64,
	now: DateTime<Utc>,
) -> Result<Precheck, AppError> {
	if record.status() != PendingStatus::Pending.as_str() {
		return Err(AppError::AlreadyDecided(record.status().to_string()));
	}
	if record.expires_at() < now {
		return Ok(Precheck::Expire);
	}
	if record.maker_admin_id() == checker_admin_id {
		return Err(AppError::SegregationViolation);
	}
	Ok(Precheck::Proceed)
}

/// Reject needs a non-blank reason; approve ignores it.
pub fn rejection_reason(
	action: DecisionAction,
	reason: Option<&str>,
) -> Result<Option<String>, AppError> {
	match action {
		DecisionAction::Approve => Ok(None),
		DecisionAction::Reject => reason
			.map(str::trim)
			.filter(|r| !r.is_empty())
			.map(|r| Some(r.to_string()))
			.ok_or(AppError::MissingReason),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	struct Stub {
		status: &'static str,
		maker: i64,
		expires_at: DateTime<Utc>,
	}

	impl Decidable for Stub {
		fn status(&self) -> &str {
			self.status
		}

		fn maker_admin_id(&self) -> i64 {
			self.maker
		}

		fn expires_at(&self) -> DateTime<Utc> {
			self.expires_at
		}
	}

	#[test]
	fn test_terminal_records_are_already_decided() {
		let now = Utc::now();
		for status in ["approved", "rejected", "expired"] {
			let s = Stub { status, maker: 1, expires_at: now + Duration::hours(1) };
			match precheck(&s, 2, now) {
				Err(AppError::AlreadyDecided(st)) => assert_eq!(st, status),
				other => panic!("unexpected {:?}", other),
			}
		}
	}

	#[test]
	fn test_expiry_edges() {
		let now = Utc::now();
		let eps = Duration::milliseconds(1);
		let before = Stub { status: "pending", maker: 1, expires_at: now + eps };
		assert_eq!(precheck(&before, 2, now).unwrap(), Precheck::Proceed);

		let at = Stub { status: "pending", maker: 1, expires_at: now };
		assert_eq!(precheck(&at, 2, now).unwrap(), Precheck::Proceed);

		let after = Stub { status: "pending", maker: 1, expires_at: now - eps };
		assert_eq!(precheck(&after, 2, now).unwrap(), Precheck::Expire);
		assert!(after.is_overdue(now));
	}

	#[test]
	fn test_expiry_wins_over_segregation() {
		let now = Utc::now();
		let s = Stub { status: "pending", maker: 7, expires_at: now - Duration::seconds(5) };
		assert_eq!(precheck(&s, 7, now).unwrap(), Precheck::Expire);
	}

	#[test]
	fn test_maker_cannot_check() {
		let now = Utc::now();
		let s = Stub { status: "pending", maker: 7, expires_at: now + Duration::hours(2) };
		assert!(matches!(precheck(&s, 7, now), Err(AppError::SegregationViolation)));
	}

	#[test]
	fn test_rejection_reason_required() {
		assert_eq!(rejection_reason(DecisionAction::Approve, None).unwrap(), None);
		assert!(matches!(
			rejection_reason(DecisionAction::Reject, Some("   ")),
			Err(AppError::MissingReason)
		));
		assert!(matches!(rejection_reason(DecisionAction::Reject, None), Err(AppError::MissingReason)));
		assert_eq!(
			rejection_reason(DecisionAction::Reject, Some(" wrong amount ")).unwrap().as_deref(),
			Some("wrong amount")
		);
	}
}
