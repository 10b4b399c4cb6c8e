use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    MoneyMinor, ResultLedger, Transition, account,
    referral::{Referral, ReferralStatus},
    transitions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Credit the deposit wallet.
    ///
    /// A referred account's **first** deposit also opens a pending referral
    /// entry for admin review; the bonus itself is only credited on
    /// approval.
    pub async fn deposit(
        &self,
        account_id: Uuid,
        amount: MoneyMinor,
        upi_reference: Option<String>,
        now: DateTime<Utc>,
    ) -> ResultLedger<Transition> {
        with_tx!(self, |db_tx| {
            let account = self.load_account(&db_tx, account_id).await?;
            super::require_unblocked(&account)?;
            let first_deposit = account.total_deposited.is_zero();
            let referred_by = account.referred_by.clone();

            let transition = transitions::deposit(account, amount, upi_reference, now)?;
            self.persist_transition(&db_tx, &transition).await?;

            if first_deposit && let Some(code) = referred_by {
                let referrer = account::Entity::find()
                    .filter(account::Column::ReferralCode.eq(code.clone()))
                    .one(&db_tx)
                    .await?;
                match referrer.and_then(|m| Uuid::parse_str(&m.id).ok()) {
                    Some(referrer_id) => {
                        let referral = Referral {
                            id: Uuid::new_v4(),
                            referrer_account_id: referrer_id,
                            referred_account_id: account_id,
                            first_deposit: amount,
                            status: ReferralStatus::Pending,
                            created_at: now,
                            decided_at: None,
                        };
                        let model: crate::referral::ActiveModel = (&referral).into();
                        model.insert(&db_tx).await?;
                        tracing::info!(%referrer_id, referred = %account_id, "opened pending referral");
                    }
                    None => {
                        // The code was valid at registration; a missing
                        // referrer now should not fail the deposit.
                        tracing::warn!(code, referred = %account_id, "referrer vanished, skipping referral");
                    }
                }
            }

            Ok(transition)
        })
    }

    /// Debit the withdrawal wallet. Insufficient funds still produce (and
    /// persist) a `failed` record.
    pub async fn withdraw(
        &self,
        account_id: Uuid,
        amount: MoneyMinor,
        destination: Option<String>,
        now: DateTime<Utc>,
    ) -> ResultLedger<Transition> {
        with_tx!(self, |db_tx| {
            let account = self.load_account(&db_tx, account_id).await?;
            super::require_unblocked(&account)?;
            let transition = transitions::withdraw(account, amount, destination, now)?;
            self.persist_transition(&db_tx, &transition).await?;
            Ok(transition)
        })
    }
}
