//! Wire DTOs for the AcuPay backend. Field names follow the backend's JSON
//! (camelCase, e.g. `toAccountNumber`, `tranPin`, `transactionRef`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_no: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub account_number: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUser {
    pub name: String,
    pub account_number: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub user: DashboardUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientRequest {
    pub account_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientResponse {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub amount: f64,
    pub to_account_number: String,
    pub tran_description: String,
    pub tran_pin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParty {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub transaction_ref: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<TransactionParty>,
    pub to_account_number: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Display name for the credited party, falling back to the raw account
    /// number when the backend did not embed one.
    pub fn recipient_display(&self) -> &str {
        self.receiver
            .as_ref()
            .map(|party| party.name.as_str())
            .unwrap_or(self.to_account_number.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub balance: f64,
    pub transaction: TransactionRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub transaction_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<TransactionParty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<TransactionParty>,
    pub amount: f64,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub transactions: Vec<HistoryEntry>,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPinRequest {
    pub tran_pin: String,
}

/// The backend's error envelope: `{ "error": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_request_uses_backend_field_names() {
        let request = TransferRequest {
            amount: 50.0,
            to_account_number: "ACUP8112994147".into(),
            tran_description: "rent".into(),
            tran_pin: "1234".into(),
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["toAccountNumber"], "ACUP8112994147");
        assert_eq!(json["tranDescription"], "rent");
        assert_eq!(json["tranPin"], "1234");
    }

    #[test]
    fn transaction_record_decodes_without_receiver() {
        let record: TransactionRecord = serde_json::from_str(
            r#"{
                "transactionRef": "TXN123",
                "amount": 50,
                "toAccountNumber": "ACUP8112994147",
                "description": "rent",
                "createdAt": "2024-01-01T00:00:00Z"
            }"#,
        )
        .expect("decode");
        assert_eq!(record.recipient_display(), "ACUP8112994147");
    }
}
