//! Wire types shared by the Nivesh server and its clients.
//!
//! Monetary fields are always `*_minor`: integer minor units (paise).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub name: String,
        pub phone: String,
        pub password: String,
        pub referral_code: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PositionView {
        pub id: Uuid,
        pub product_id: Uuid,
        pub product_name: String,
        pub daily_yield_minor: i64,
        pub cycle_days: i64,
        pub purchased_at: DateTime<Utc>,
        pub days_held: i64,
        pub active: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub phone: String,
        pub referral_code: String,
        pub deposit_wallet_minor: i64,
        pub withdrawal_wallet_minor: i64,
        pub total_deposited_minor: i64,
        pub total_withdrawn_minor: i64,
        pub daily_income_rate_minor: i64,
        pub last_accrual_at: Option<DateTime<Utc>>,
        pub positions: Vec<PositionView>,
    }
}

pub mod funds {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        pub amount_minor: i64,
        pub upi_reference: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawNew {
        pub amount_minor: i64,
        pub destination: Option<String>,
    }

    /// Outcome of a funds/position operation: the record that was appended
    /// (if any) plus whether the operation applied.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct OperationResult {
        pub applied: bool,
        pub record: Option<record::RecordView>,
        pub deposit_wallet_minor: i64,
        pub withdrawal_wallet_minor: i64,
    }
}

pub mod product {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductView {
        pub id: Uuid,
        pub name: String,
        pub price_minor: i64,
        pub daily_yield_minor: i64,
        pub cycle_days: i64,
        pub resale_value_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        pub product_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SellNew {
        pub position_id: Uuid,
    }
}

pub mod record {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecordKind {
        Deposit,
        Withdraw,
        Purchase,
        Sale,
        DailyIncome,
        ReferralBonus,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecordStatus {
        Completed,
        Pending,
        Failed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecordView {
        pub id: Uuid,
        pub kind: RecordKind,
        pub status: RecordStatus,
        pub amount_minor: i64,
        pub occurred_at: DateTime<Utc>,
        /// Human-readable detail line derived from the kind-specific payload.
        pub detail: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecordList {
        pub kinds: Option<Vec<RecordKind>>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecordListResponse {
        pub records: Vec<RecordView>,
    }
}

pub mod referral {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TierView {
        pub min_referrals: u32,
        pub max_referrals: Option<u32>,
        pub bonus_percent: u8,
        pub reward: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReferralSummaryView {
        pub referral_code: String,
        pub approved: u32,
        pub pending: u32,
        pub current_tier: Option<TierView>,
    }
}

pub mod admin {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountSummary {
        pub id: Uuid,
        pub name: String,
        pub phone: String,
        pub deposit_wallet_minor: i64,
        pub withdrawal_wallet_minor: i64,
        pub total_deposited_minor: i64,
        pub total_withdrawn_minor: i64,
        pub open_positions: usize,
        pub blocked: bool,
        pub is_admin: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountListResponse {
        pub accounts: Vec<AccountSummary>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BlockUpdate {
        pub blocked: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReferralView {
        pub id: Uuid,
        pub referrer_account_id: Uuid,
        pub referred_account_id: Uuid,
        pub first_deposit_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReferralListResponse {
        pub referrals: Vec<ReferralView>,
    }
}
