use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, MoneyMinor, ResultLedger, Transition, position, transitions};

use super::{Engine, with_tx};

impl Engine {
    /// Buy a product from the catalog.
    ///
    /// The price check happens here, against the freshly loaded snapshot,
    /// before the core transition is invoked: the transition's contract
    /// requires a pre-validated price.
    pub async fn purchase(
        &self,
        account_id: Uuid,
        product_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultLedger<Transition> {
        with_tx!(self, |db_tx| {
            let catalog = self.load_catalog(&db_tx).await?;
            let product = catalog.purchasable(product_id)?;

            let account = self.load_account(&db_tx, account_id).await?;
            super::require_unblocked(&account)?;
            if account.deposit_wallet < product.price {
                return Err(LedgerError::InsufficientFunds(format!(
                    "deposit wallet {} cannot cover {}",
                    account.deposit_wallet, product.price
                )));
            }

            let transition = transitions::purchase(account, product, now)?;
            self.persist_transition(&db_tx, &transition).await?;

            // The transition appended exactly one position.
            if let Some(opened) = transition.account.positions.last() {
                let mut model: position::ActiveModel = opened.into();
                model.account_id = ActiveValue::Set(account_id.to_string());
                model.insert(&db_tx).await?;
            }

            Ok(transition)
        })
    }

    /// Sell an owned position at the product's resale value.
    pub async fn sell(
        &self,
        account_id: Uuid,
        position_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultLedger<Transition> {
        with_tx!(self, |db_tx| {
            let catalog = self.load_catalog(&db_tx).await?;
            let account = self.load_account(&db_tx, account_id).await?;
            super::require_unblocked(&account)?;

            let position = account
                .position(position_id)
                .ok_or_else(|| LedgerError::KeyNotFound(format!("position {position_id} not owned")))?;
            let sell_price = catalog
                .get(position.product_id)
                .map(|p| p.resale_value)
                .unwrap_or(MoneyMinor::ZERO);

            let transition = transitions::sell(account, position_id, sell_price, now)?;
            self.persist_transition(&db_tx, &transition).await?;

            position::Entity::delete_by_id(position_id.to_string())
                .exec(&db_tx)
                .await?;

            Ok(transition)
        })
    }
}
