use super::{AdminRole, Priority, TransactionType, UserRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

string_enum!(DecisionAction {
	Approve => "approve",
	Reject => "reject",
});

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct MoneyRequest {
	#[validate(range(min = 1))]
	pub amount: i64,
	#[validate(length(max = 255))]
	pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct TransferRequest {
	#[validate(length(min = 1, max = 50))]
	pub to_account_number: String,
	#[validate(range(min = 1))]
	pub amount: i64,
	#[validate(length(max = 255))]
	pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct ProfileUpdate {
	#[validate(length(min = 1, max = 100))]
	pub name: Option<String>,
	#[validate(email)]
	pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct ChangePinRequest {
	#[validate(length(min = 6, max = 6))]
	pub old_pin: String,
	#[validate(length(min = 6, max = 6))]
	pub new_pin: String,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct AddBankAccountRequest {
	#[validate(length(min = 1, max = 50))]
	pub account_number: String,
	#[validate(length(min = 1, max = 100))]
	pub account_name: String,
	#[validate(length(min = 1, max = 20))]
	pub bank_code: String,
	pub is_primary: Option<bool>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct UserLoginRequest {
	#[validate(length(min = 1, max = 20))]
	pub phone: String,
	#[validate(length(min = 6, max = 6))]
	pub pin: String,
	#[validate(length(min = 1, max = 20))]
	pub device_type: String,
	#[validate(length(min = 1, max = 128))]
	pub device_id: String,
	#[validate(length(min = 1, max = 128))]
	pub device_name: String,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct AdminLoginRequest {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1))]
	pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResp {
	pub uid: String,
	pub token: String,
	pub session_id: Option<i64>,
	pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct CreateUserRequest {
	#[validate(length(min = 1, max = 100))]
	pub name: String,
	#[validate(length(min = 6, max = 20))]
	pub phone: String,
	#[validate(email)]
	pub email: Option<String>,
	#[validate(length(min = 6, max = 6))]
	pub pin: String,
	pub role: Option<UserRole>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct UpdateUserRequest {
	#[validate(length(min = 1, max = 100))]
	pub name: Option<String>,
	#[validate(email)]
	pub email: Option<String>,
	pub role: Option<UserRole>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct CreateAdminRequest {
	#[validate(length(min = 1, max = 100))]
	pub name: String,
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8))]
	pub password: String,
	pub role: Option<AdminRole>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct UpdateAdminRequest {
	#[validate(length(min = 1, max = 100))]
	pub name: Option<String>,
	pub role: Option<AdminRole>,
	pub status: Option<super::AdminStatus>,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone)]
pub struct BalanceChangeRequest {
	pub transaction_type: TransactionType,
	#[validate(range(min = 1))]
	pub amount: i64,
	#[validate(length(max = 255))]
	pub description: Option<String>,
	#[validate(length(max = 500))]
	pub reason: Option<String>,
	pub priority: Option<Priority>,
	pub request_data: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct StagePendingRequest {
	pub user_id: i64,
	#[validate(nested)]
	#[serde(flatten)]
	pub change: BalanceChangeRequest,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct DecideRequest {
	pub action: DecisionAction,
	#[validate(length(max = 500))]
	pub comments: Option<String>,
	#[validate(length(max = 500))]
	pub rejection_reason: Option<String>,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct ThresholdUpsertRequest {
	pub transaction_type: TransactionType,
	#[validate(range(min = 1))]
	pub amount_threshold: i64,
	#[serde(default)]
	pub requires_dual_approval: bool,
	pub dual_approval_threshold: Option<i64>,
	#[validate(range(min = 1, max = 720))]
	pub auto_expire_hours: i32,
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct StageStatusChangeRequest {
	pub requested_status: i16,
	#[validate(length(min = 1, max = 500))]
	pub reason: String,
	pub priority: Option<Priority>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UserListQuery {
	pub status: Option<i16>,
	pub search: Option<String>,
	pub page: Option<i64>,
	pub limit: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ThresholdListQuery {
	pub active_only: Option<bool>,
}

/// Result of an admin balance submission: executed at once or parked for a checker.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum BalanceChangeOutcome {
	Executed(super::Transaction),
	Staged(super::PendingTransaction),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pins_must_be_six_characters() {
		let short = ChangePinRequest { old_pin: "1234".into(), new_pin: "654321".into() };
		assert!(short.validate().is_err());
		let long = ChangePinRequest { old_pin: "1234567".into(), new_pin: "654321".into() };
		assert!(long.validate().is_err());
		let ok = ChangePinRequest { old_pin: "123456".into(), new_pin: "654321".into() };
		assert!(ok.validate().is_ok());

		let login = UserLoginRequest {
			phone: "081234567890".into(),
			pin: "1234".into(),
			device_type: "android".into(),
			device_id: "dev-1".into(),
			device_name: "Pixel 8".into(),
		};
		assert!(login.validate().is_err());
		assert!(UserLoginRequest { pin: "123456".into(), ..login }.validate().is_ok());
	}
}
