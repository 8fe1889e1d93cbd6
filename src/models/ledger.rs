use crate::schema::transactions;
use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

string_enum!(TransactionType {
	Topup => "topup",
	Withdraw => "withdraw",
	TransferOut => "transfer_out",
	TransferIn => "transfer_in",
	BalanceAdjustment => "balance_adjustment",
	BalanceSet => "balance_set",
});

impl TransactionType {
	/// Kinds an admin may request against a customer balance.
	pub fn is_admin_change(&self) -> bool {
		matches!(
			self,
			TransactionType::Topup |
				TransactionType::Withdraw |
				TransactionType::BalanceAdjustment |
				TransactionType::BalanceSet
		)
	}
}

string_enum!(TransactionStatus {
	Completed => "completed",
	Failed => "failed",
	Pending => "pending",
});

/// Immutable ledger entry.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(Pg))]
pub struct Transaction {
	pub id: i64,
	pub user_id: i64,
	pub transaction_type: String,
	pub amount: i64,
	pub balance_before: i64,
	pub balance_after: i64,
	pub description: String,
	pub status: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = transactions)]
pub struct NewTransaction<'a> {
	pub user_id: i64,
	pub transaction_type: &'a str,
	pub amount: i64,
	pub balance_before: i64,
	pub balance_after: i64,
	pub description: &'a str,
	pub status: &'a str,
	pub created_at: DateTime<Utc>,
}

/// Both legs of a committed transfer.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TransferReceipt {
	pub transfer_out: Transaction,
	pub transfer_in: Transaction,
}
