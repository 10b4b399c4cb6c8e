//! The module contains the `Account` type, one user's financial state.
//!
//! An account carries two wallets with disjoint funding rules:
//!
//! - the **deposit wallet** receives deposits and pays for product purchases;
//! - the **withdrawal wallet** receives accrued daily income, sale proceeds
//!   and referral bonuses, and pays out withdrawals.
//!
//! Nothing else moves money between them. Accounts are never hard-deleted;
//! blocking is a flag.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, MoneyMinor, position::Position};

/// One user's financial state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub referral_code: String,
    /// Referral code of the account that referred this one, if any.
    pub referred_by: Option<String>,
    pub deposit_wallet: MoneyMinor,
    pub withdrawal_wallet: MoneyMinor,
    /// Lifetime counters; monotonically non-decreasing.
    pub total_deposited: MoneyMinor,
    pub total_withdrawn: MoneyMinor,
    pub positions: Vec<Position>,
    /// Sum of active positions' per-day yield, refreshed on purchase, sale
    /// and accrual.
    pub daily_income_rate: MoneyMinor,
    /// Last time daily income was credited; guards against double-crediting
    /// within one calendar day.
    pub last_accrual_at: Option<DateTime<Utc>>,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A fresh account with all monetary fields zeroed.
    pub fn new(
        name: String,
        phone: String,
        referral_code: String,
        referred_by: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone,
            referral_code,
            referred_by,
            deposit_wallet: MoneyMinor::ZERO,
            withdrawal_wallet: MoneyMinor::ZERO,
            total_deposited: MoneyMinor::ZERO,
            total_withdrawn: MoneyMinor::ZERO,
            positions: Vec::new(),
            daily_income_rate: MoneyMinor::ZERO,
            last_accrual_at: None,
            blocked: false,
            created_at,
        }
    }

    pub fn position(&self, position_id: Uuid) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == position_id)
    }

    /// Sum of per-day yields over positions still active at `now`.
    #[must_use]
    pub fn active_daily_rate(&self, now: DateTime<Utc>) -> MoneyMinor {
        self.positions
            .iter()
            .filter(|p| p.is_active(now))
            .map(|p| p.daily_yield)
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub phone: String,
    pub password: String,
    #[sea_orm(unique)]
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub deposit_wallet_minor: i64,
    pub withdrawal_wallet_minor: i64,
    pub total_deposited_minor: i64,
    pub total_withdrawn_minor: i64,
    pub daily_income_rate_minor: i64,
    pub last_accrual_at: Option<DateTimeUtc>,
    pub blocked: bool,
    pub is_admin: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::position::Entity")]
    Positions,
    #[sea_orm(has_many = "super::records::Entity")]
    Records,
}

impl Related<super::position::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Positions.def()
    }
}

impl Related<super::records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Balance/position fields only; identity, password and flags are managed by
/// dedicated ops and left `NotSet` here.
impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            name: ActiveValue::Set(account.name.clone()),
            phone: ActiveValue::Set(account.phone.clone()),
            password: ActiveValue::NotSet,
            referral_code: ActiveValue::Set(account.referral_code.clone()),
            referred_by: ActiveValue::Set(account.referred_by.clone()),
            deposit_wallet_minor: ActiveValue::Set(account.deposit_wallet.minor()),
            withdrawal_wallet_minor: ActiveValue::Set(account.withdrawal_wallet.minor()),
            total_deposited_minor: ActiveValue::Set(account.total_deposited.minor()),
            total_withdrawn_minor: ActiveValue::Set(account.total_withdrawn.minor()),
            daily_income_rate_minor: ActiveValue::Set(account.daily_income_rate.minor()),
            last_accrual_at: ActiveValue::Set(account.last_accrual_at),
            blocked: ActiveValue::Set(account.blocked),
            is_admin: ActiveValue::NotSet,
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<(Model, Vec<Position>)> for Account {
    type Error = LedgerError;

    fn try_from((model, positions): (Model, Vec<Position>)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("account not exists".to_string()))?,
            name: model.name,
            phone: model.phone,
            referral_code: model.referral_code,
            referred_by: model.referred_by,
            deposit_wallet: MoneyMinor::new(model.deposit_wallet_minor),
            withdrawal_wallet: MoneyMinor::new(model.withdrawal_wallet_minor),
            total_deposited: MoneyMinor::new(model.total_deposited_minor),
            total_withdrawn: MoneyMinor::new(model.total_withdrawn_minor),
            positions,
            daily_income_rate: MoneyMinor::new(model.daily_income_rate_minor),
            last_accrual_at: model.last_accrual_at,
            blocked: model.blocked,
            created_at: model.created_at,
        })
    }
}
