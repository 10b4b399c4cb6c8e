//! Referral tiers and pending referral entries.
//!
//! A tier is a static configuration row mapping a referrer's approved
//! referral count to a bonus percentage. A referral entry is created when a
//! referred account makes its first deposit and waits for an admin decision.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyMinor};

/// Static configuration row: referral-count range to bonus percentage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralTier {
    /// Inclusive lower bound on the referrer's approved referral count.
    pub min_referrals: u32,
    /// Inclusive upper bound; `None` for the open-ended top tier.
    pub max_referrals: Option<u32>,
    pub bonus_percent: u8,
    pub reward: String,
}

impl ReferralTier {
    pub fn contains(&self, count: u32) -> bool {
        count >= self.min_referrals && self.max_referrals.is_none_or(|max| count <= max)
    }

    /// Default tier table used when the database has no rows yet.
    pub fn defaults() -> Vec<ReferralTier> {
        vec![
            ReferralTier {
                min_referrals: 1,
                max_referrals: Some(5),
                bonus_percent: 10,
                reward: "10% of first deposit".to_string(),
            },
            ReferralTier {
                min_referrals: 6,
                max_referrals: Some(15),
                bonus_percent: 15,
                reward: "15% of first deposit".to_string(),
            },
            ReferralTier {
                min_referrals: 16,
                max_referrals: Some(30),
                bonus_percent: 20,
                reward: "20% of first deposit".to_string(),
            },
            ReferralTier {
                min_referrals: 31,
                max_referrals: None,
                bonus_percent: 25,
                reward: "25% of first deposit".to_string(),
            },
        ]
    }
}

/// Tier a referrer lands in with `count` approved referrals (the one being
/// approved included).
pub fn tier_for(tiers: &[ReferralTier], count: u32) -> Option<&ReferralTier> {
    tiers.iter().find(|tier| tier.contains(count))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReferralStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for ReferralStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(LedgerError::KeyNotFound(format!(
                "invalid referral status: {other}"
            ))),
        }
    }
}

/// A referral awaiting (or past) admin review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_account_id: Uuid,
    pub referred_account_id: Uuid,
    /// The referred account's first deposit, the base for the bonus.
    pub first_deposit: MoneyMinor,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub referrer_account_id: String,
    pub referred_account_id: String,
    pub first_deposit_minor: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub decided_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::ReferrerAccountId",
        to = "super::account::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Referrer,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Referral> for ActiveModel {
    fn from(referral: &Referral) -> Self {
        Self {
            id: ActiveValue::Set(referral.id.to_string()),
            referrer_account_id: ActiveValue::Set(referral.referrer_account_id.to_string()),
            referred_account_id: ActiveValue::Set(referral.referred_account_id.to_string()),
            first_deposit_minor: ActiveValue::Set(referral.first_deposit.minor()),
            status: ActiveValue::Set(referral.status.as_str().to_string()),
            created_at: ActiveValue::Set(referral.created_at),
            decided_at: ActiveValue::Set(referral.decided_at),
        }
    }
}

impl TryFrom<Model> for Referral {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("referral not exists".to_string()))?,
            referrer_account_id: Uuid::parse_str(&model.referrer_account_id)
                .map_err(|_| LedgerError::KeyNotFound("account not exists".to_string()))?,
            referred_account_id: Uuid::parse_str(&model.referred_account_id)
                .map_err(|_| LedgerError::KeyNotFound("account not exists".to_string()))?,
            first_deposit: MoneyMinor::new(model.first_deposit_minor),
            status: ReferralStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            decided_at: model.decided_at,
        })
    }
}

/// Tier reference table.
pub mod tiers {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "referral_tiers")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub min_referrals: i64,
        pub max_referrals: Option<i64>,
        pub bonus_percent: i64,
        pub reward: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl From<tiers::Model> for ReferralTier {
    fn from(model: tiers::Model) -> Self {
        Self {
            min_referrals: model.min_referrals.max(0) as u32,
            max_referrals: model.max_referrals.map(|v| v.max(0) as u32),
            bonus_percent: model.bonus_percent.clamp(0, 100) as u8,
            reward: model.reward,
        }
    }
}
