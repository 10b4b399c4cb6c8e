use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{AccrualPolicy, ResultLedger, Transition, account, position, transitions};

use super::{Engine, with_tx};

impl Engine {
    /// Run the daily income pass for one account, policy permitting.
    ///
    /// Used check-on-read when serving an account snapshot and by the sweep.
    /// When the policy forbids running (too early in the local day), the
    /// stored snapshot is returned untouched with `applied = false`.
    pub async fn accrue(
        &self,
        account_id: Uuid,
        policy: &AccrualPolicy,
        now: DateTime<Utc>,
    ) -> ResultLedger<Transition> {
        with_tx!(self, |db_tx| {
            let account = self.load_account(&db_tx, account_id).await?;

            if !policy.permits(now) {
                return Ok(Transition {
                    account,
                    record: None,
                    applied: false,
                });
            }

            let kept_before: Vec<Uuid> = account.positions.iter().map(|p| p.id).collect();
            let transition = transitions::accrue_daily_income(account, now);
            self.persist_transition(&db_tx, &transition).await?;

            if transition.applied {
                for pruned in kept_before
                    .iter()
                    .filter(|id| transition.account.position(**id).is_none())
                {
                    position::Entity::delete_by_id(pruned.to_string())
                        .exec(&db_tx)
                        .await?;
                }
            }

            Ok(transition)
        })
    }

    /// Apply the daily income pass across every unblocked account.
    ///
    /// Each account runs in its own DB transaction so one bad row cannot
    /// poison the sweep. Returns how many accounts actually accrued income.
    pub async fn accrue_all(
        &self,
        policy: &AccrualPolicy,
        now: DateTime<Utc>,
    ) -> ResultLedger<usize> {
        if !policy.permits(now) {
            return Ok(0);
        }

        let ids: Vec<String> = {
            let db_tx = self.database.begin().await?;
            let models = account::Entity::find()
                .filter(account::Column::Blocked.eq(false))
                .all(&db_tx)
                .await?;
            db_tx.commit().await?;
            models.into_iter().map(|m| m.id).collect()
        };

        let mut credited = 0;
        for id in ids {
            let Ok(account_id) = Uuid::parse_str(&id) else {
                tracing::warn!(id, "skipping account with malformed id");
                continue;
            };
            match self.accrue(account_id, policy, now).await {
                Ok(transition) if transition.record.is_some() => credited += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(%account_id, "accrual sweep failed for account: {err}");
                }
            }
        }

        Ok(credited)
    }
}
