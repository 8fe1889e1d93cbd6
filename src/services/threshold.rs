use super::audit::{AuditEntry, AuditTrail};
use crate::{
	constants::ENTITY_APPROVAL_THRESHOLD,
	error::AppError,
	models::{
		dto::ThresholdUpsertRequest, Actor, ApprovalThreshold, AuditAction, ThresholdValues,
		TransactionType,
	},
	repo::ThresholdRepo,
};
use chrono::Utc;
use diesel::prelude::*;

/// Dual approval needs its own amount, strictly above the single-approval threshold.
pub fn validate(req: &ThresholdUpsertRequest) -> Result<(), AppError> {
	if !req.transaction_type.is_admin_change() {
		return Err(AppError::ValidationFailed(format!(
			"thresholds apply to admin balance changes, not {}",
			req.transaction_type
		)));
	}
	if req.amount_threshold < 1 {
		return Err(AppError::ValidationFailed("amount_threshold must be positive".to_string()));
	}
	if req.requires_dual_approval {
		match req.dual_approval_threshold {
			Some(dual) if dual > req.amount_threshold => {},
			Some(_) =>
				return Err(AppError::ValidationFailed(
					"dual_approval_threshold must exceed amount_threshold".to_string(),
				)),
			None =>
				return Err(AppError::ValidationFailed(
					"dual_approval_threshold is required when dual approval is on".to_string(),
				)),
		}
	}
	Ok(())
}

pub struct ThresholdPolicy;

impl ThresholdPolicy {
	pub fn get(conn: &mut PgConnection, kind: TransactionType) -> Result<ApprovalThreshold, AppError> {
		ThresholdRepo::find_by_type(conn, kind.as_str())?.ok_or(AppError::NotFound("Approval threshold"))
	}

	pub fn get_all(
		conn: &mut PgConnection,
		active_only: bool,
	) -> Result<Vec<ApprovalThreshold>, AppError> {
		ThresholdRepo::list(conn, active_only)
	}

	/// Creates or replaces the policy for a kind; an upsert always (re)activates it.
	pub fn upsert(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		admin_id: i64,
		req: &ThresholdUpsertRequest,
	) -> Result<ApprovalThreshold, AppError> {
		validate(req)?;
		let kind = req.transaction_type.as_str();
		let (before, after) = conn.transaction::<_, AppError, _>(|conn| {
			let before = ThresholdRepo::find_by_type(conn, kind)?;
			if let Some(existing) = &before {
				ThresholdRepo::lock(conn, existing.id)?;
			}
			let after = ThresholdRepo::upsert(
				conn,
				&ThresholdValues {
					transaction_type: kind,
					amount_threshold: req.amount_threshold,
					requires_dual_approval: req.requires_dual_approval,
					dual_approval_threshold: if req.requires_dual_approval {
						req.dual_approval_threshold
					} else {
						None
					},
					auto_expire_hours: req.auto_expire_hours,
					is_active: true,
					updated_at: Utc::now(),
				},
			)?;
			Ok((before, after))
		})?;

		log::info!(
			"Admin {} set {} threshold to {} (dual: {:?})",
			admin_id,
			kind,
			after.amount_threshold,
			after.dual_approval_threshold
		);
		let entry = match &before {
			Some(old) => AuditEntry::new(
				Actor::Admin(admin_id),
				AuditAction::Update,
				ENTITY_APPROVAL_THRESHOLD,
				after.id,
			)
			.old(old),
			None => AuditEntry::new(
				Actor::Admin(admin_id),
				AuditAction::Create,
				ENTITY_APPROVAL_THRESHOLD,
				after.id,
			),
		};
		trail.record(conn, entry.new_values(&after), if before.is_some() { 200 } else { 201 });
		Ok(after)
	}

	pub fn deactivate(
		conn: &mut PgConnection,
		trail: &AuditTrail,
		admin_id: i64,
		threshold_id: i64,
	) -> Result<ApprovalThreshold, AppError> {
		let (before, after) = conn.transaction::<_, AppError, _>(|conn| {
			let before = ThresholdRepo::lock(conn, threshold_id)?;
			let after = ThresholdRepo::deactivate(conn, threshold_id, Utc::now())?;
			Ok((before, after))
		})?;
		log::info!("Admin {} deactivated {} threshold #{}", admin_id, after.transaction_type, after.id);
		trail.record(
			conn,
			AuditEntry::new(
				Actor::Admin(admin_id),
				AuditAction::Deactivate,
				ENTITY_APPROVAL_THRESHOLD,
				after.id,
			)
			.old(&before)
			.new_values(&after),
			200,
		);
		Ok(after)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn req(amount: i64, dual: bool, dual_amount: Option<i64>) -> ThresholdUpsertRequest {
		ThresholdUpsertRequest {
			transaction_type: TransactionType::Topup,
			amount_threshold: amount,
			requires_dual_approval: dual,
			dual_approval_threshold: dual_amount,
			auto_expire_hours: 24,
		}
	}

	#[test]
	fn test_dual_threshold_must_exceed_base() {
		assert!(validate(&req(1_000, true, Some(1_001))).is_ok());
		assert!(validate(&req(1_000, true, Some(1_000))).is_err());
		assert!(validate(&req(1_000, true, Some(10))).is_err());
		assert!(validate(&req(1_000, true, None)).is_err());
	}

	#[test]
	fn test_single_approval_ignores_dual_amount() {
		assert!(validate(&req(1_000, false, None)).is_ok());
		assert!(validate(&req(1_000, false, Some(5))).is_ok());
	}

	#[test]
	fn test_transfer_legs_have_no_policy() {
		let mut r = req(1_000, false, None);
		r.transaction_type = TransactionType::TransferIn;
		assert!(matches!(validate(&r), Err(AppError::ValidationFailed(_))));
	}
}
