//! The module contains the `Position` type, one purchased product instance.
//!
//! A position is an independent income-generating holding: it carries its own
//! purchase timestamp and cycle length, and keeps yielding its product's
//! daily income until the cycle elapses.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyMinor};

/// One purchased product instance owned by an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub daily_yield: MoneyMinor,
    pub cycle_days: i64,
    pub purchased_at: DateTime<Utc>,
}

impl Position {
    pub fn new(
        product_id: Uuid,
        product_name: String,
        daily_yield: MoneyMinor,
        cycle_days: i64,
        purchased_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            product_name,
            daily_yield,
            cycle_days,
            purchased_at,
        }
    }

    /// Whole days elapsed since purchase.
    #[must_use]
    pub fn days_held(&self, now: DateTime<Utc>) -> i64 {
        (now - self.purchased_at).num_days()
    }

    /// A position is active while `days_held < cycle_days`.
    ///
    /// Day `cycle_days - 1` is the last income-generating day; on day
    /// `cycle_days` the position is expired. The transition is one-way.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.days_held(now) < self.cycle_days
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "positions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub product_id: String,
    pub product_name: String,
    pub daily_yield_minor: i64,
    pub cycle_days: i64,
    pub purchased_at: DateTimeUtc,
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

impl From<&Position> for ActiveModel {
    fn from(position: &Position) -> Self {
        Self {
            id: ActiveValue::Set(position.id.to_string()),
            account_id: ActiveValue::NotSet,
            product_id: ActiveValue::Set(position.product_id.to_string()),
            product_name: ActiveValue::Set(position.product_name.clone()),
            daily_yield_minor: ActiveValue::Set(position.daily_yield.minor()),
            cycle_days: ActiveValue::Set(position.cycle_days),
            purchased_at: ActiveValue::Set(position.purchased_at),
        }
    }
}

impl TryFrom<Model> for Position {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("position not exists".to_string()))?,
            product_id: Uuid::parse_str(&model.product_id)
                .map_err(|_| LedgerError::KeyNotFound("product not exists".to_string()))?,
            product_name: model.product_name,
            daily_yield: MoneyMinor::new(model.daily_yield_minor),
            cycle_days: model.cycle_days,
            purchased_at: model.purchased_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn position(cycle_days: i64) -> Position {
        Position::new(
            Uuid::new_v4(),
            "Solar Fund A".to_string(),
            MoneyMinor::new(2000),
            cycle_days,
            Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn active_through_last_cycle_day() {
        let position = position(45);
        let purchased = position.purchased_at;

        assert!(position.is_active(purchased));
        assert!(position.is_active(purchased + Duration::days(44)));
        assert!(!position.is_active(purchased + Duration::days(45)));
        assert!(!position.is_active(purchased + Duration::days(300)));
    }

    #[test]
    fn partial_day_does_not_count() {
        let position = position(45);
        let almost_a_day = position.purchased_at + Duration::hours(23);

        assert_eq!(position.days_held(almost_a_day), 0);
        assert!(position.is_active(almost_a_day));
    }
}
