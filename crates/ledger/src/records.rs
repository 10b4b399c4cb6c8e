//! Transaction record primitives.
//!
//! A `TransactionRecord` is an immutable audit entry appended for every
//! state-changing ledger operation. Records are create-once: nothing in the
//! engine or the ops layer ever mutates or deletes one.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyMinor, ResultLedger};

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

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::DailyIncome => "daily_income",
            Self::ReferralBonus => "referral_bonus",
        }
    }
}

impl TryFrom<&str> for RecordKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            "purchase" => Ok(Self::Purchase),
            "sale" => Ok(Self::Sale),
            "daily_income" => Ok(Self::DailyIncome),
            "referral_bonus" => Ok(Self::ReferralBonus),
            other => Err(LedgerError::KeyNotFound(format!(
                "invalid record kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Completed,
    Pending,
    Failed,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for RecordStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            other => Err(LedgerError::KeyNotFound(format!(
                "invalid record status: {other}"
            ))),
        }
    }
}

/// Kind-specific record payload.
///
/// Each variant carries only the fields relevant to its kind, instead of one
/// bag of optional bank/UPI blobs shared by every record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetail {
    Deposit {
        #[serde(skip_serializing_if = "Option::is_none")]
        upi_reference: Option<String>,
    },
    Withdraw {
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Purchase {
        product_id: Uuid,
        product_name: String,
        cycle_days: i64,
    },
    Sale {
        position_id: Uuid,
        product_name: String,
    },
    DailyIncome {
        active_positions: u32,
    },
    ReferralBonus {
        referred_account_id: Uuid,
        bonus_percent: u8,
    },
}

impl RecordDetail {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Deposit { .. } => RecordKind::Deposit,
            Self::Withdraw { .. } => RecordKind::Withdraw,
            Self::Purchase { .. } => RecordKind::Purchase,
            Self::Sale { .. } => RecordKind::Sale,
            Self::DailyIncome { .. } => RecordKind::DailyIncome,
            Self::ReferralBonus { .. } => RecordKind::ReferralBonus,
        }
    }
}

/// An append-only audit entry owned by exactly one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: RecordKind,
    pub status: RecordStatus,
    pub amount: MoneyMinor,
    pub occurred_at: DateTime<Utc>,
    pub detail: RecordDetail,
}

impl TransactionRecord {
    pub fn new(
        account_id: Uuid,
        status: RecordStatus,
        amount: MoneyMinor,
        occurred_at: DateTime<Utc>,
        detail: RecordDetail,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind: detail.kind(),
            status,
            amount,
            occurred_at,
            detail,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub status: String,
    pub amount_minor: i64,
    pub occurred_at: DateTimeUtc,
    /// `RecordDetail` serialized as JSON.
    pub detail: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&TransactionRecord> for ActiveModel {
    type Error = LedgerError;

    fn try_from(record: &TransactionRecord) -> ResultLedger<Self> {
        let detail = serde_json::to_string(&record.detail)
            .map_err(|err| LedgerError::InvalidAmount(format!("unserializable detail: {err}")))?;
        Ok(Self {
            id: ActiveValue::Set(record.id.to_string()),
            account_id: ActiveValue::Set(record.account_id.to_string()),
            kind: ActiveValue::Set(record.kind.as_str().to_string()),
            status: ActiveValue::Set(record.status.as_str().to_string()),
            amount_minor: ActiveValue::Set(record.amount.minor()),
            occurred_at: ActiveValue::Set(record.occurred_at),
            detail: ActiveValue::Set(detail),
        })
    }
}

impl TryFrom<Model> for TransactionRecord {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let detail: RecordDetail = serde_json::from_str(&model.detail)
            .map_err(|_| LedgerError::KeyNotFound("unreadable record detail".to_string()))?;
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("record not exists".to_string()))?,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| LedgerError::KeyNotFound("account not exists".to_string()))?,
            kind: RecordKind::try_from(model.kind.as_str())?,
            status: RecordStatus::try_from(model.status.as_str())?,
            amount: MoneyMinor::new(model.amount_minor),
            occurred_at: model.occurred_at,
            detail,
        })
    }
}
