use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    LedgerError, ResultLedger, Transition,
    referral::{self, Referral, ReferralStatus, ReferralTier, tier_for, tiers},
    transitions,
};

use super::{Engine, with_tx};

/// What an account sees about its own referral standing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferralSummary {
    pub referral_code: String,
    pub approved: u32,
    pub pending: u32,
    pub current_tier: Option<ReferralTier>,
}

impl Engine {
    /// Referral standing for one account.
    pub async fn referral_summary(&self, account_id: Uuid) -> ResultLedger<ReferralSummary> {
        with_tx!(self, |db_tx| {
            let model = self.require_account_model(&db_tx, account_id).await?;
            let approved = self
                .count_referrals(&db_tx, account_id, ReferralStatus::Approved)
                .await?;
            let pending = self
                .count_referrals(&db_tx, account_id, ReferralStatus::Pending)
                .await?;
            let tiers = self.load_tiers(&db_tx).await?;

            Ok(ReferralSummary {
                referral_code: model.referral_code,
                approved,
                pending,
                current_tier: tier_for(&tiers, approved).cloned(),
            })
        })
    }

    /// Admin: referrals awaiting a decision, oldest first.
    pub async fn pending_referrals(&self) -> ResultLedger<Vec<Referral>> {
        with_tx!(self, |db_tx| {
            referral::Entity::find()
                .filter(referral::Column::Status.eq(ReferralStatus::Pending.as_str()))
                .order_by_asc(referral::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Referral::try_from)
                .collect::<ResultLedger<Vec<_>>>()
        })
    }

    /// Admin: approve a pending referral and credit the referrer.
    ///
    /// The bonus percentage comes from the tier the referrer lands in *with
    /// this approval counted*.
    pub async fn approve_referral(
        &self,
        referral_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultLedger<Transition> {
        with_tx!(self, |db_tx| {
            let referral = self.require_pending_referral(&db_tx, referral_id).await?;

            let approved = self
                .count_referrals(&db_tx, referral.referrer_account_id, ReferralStatus::Approved)
                .await?;
            let tiers = self.load_tiers(&db_tx).await?;
            let tier = tier_for(&tiers, approved + 1).ok_or_else(|| {
                LedgerError::KeyNotFound("no referral tier configured".to_string())
            })?;

            let referrer = self
                .load_account(&db_tx, referral.referrer_account_id)
                .await?;
            let transition = transitions::referral_bonus(
                referrer,
                referral.referred_account_id,
                referral.first_deposit,
                tier.bonus_percent,
                now,
            )?;
            self.persist_transition(&db_tx, &transition).await?;

            self.decide_referral(&db_tx, referral, ReferralStatus::Approved, now)
                .await?;
            tracing::info!(%referral_id, bonus_percent = tier.bonus_percent, "approved referral");

            Ok(transition)
        })
    }

    /// Admin: reject a pending referral. No wallet is touched.
    pub async fn reject_referral(&self, referral_id: Uuid, now: DateTime<Utc>) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let referral = self.require_pending_referral(&db_tx, referral_id).await?;
            self.decide_referral(&db_tx, referral, ReferralStatus::Rejected, now)
                .await?;
            Ok(())
        })
    }

    async fn require_pending_referral(
        &self,
        db_tx: &DatabaseTransaction,
        referral_id: Uuid,
    ) -> ResultLedger<Referral> {
        let referral: Referral = referral::Entity::find_by_id(referral_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("referral not exists".to_string()))?
            .try_into()?;

        if referral.status != ReferralStatus::Pending {
            return Err(LedgerError::ExistingKey(format!(
                "referral {referral_id} already decided"
            )));
        }
        Ok(referral)
    }

    async fn decide_referral(
        &self,
        db_tx: &DatabaseTransaction,
        referral: Referral,
        status: ReferralStatus,
        now: DateTime<Utc>,
    ) -> ResultLedger<()> {
        let mut model: referral::ActiveModel = (&referral).into();
        model.status = ActiveValue::Set(status.as_str().to_string());
        model.decided_at = ActiveValue::Set(Some(now));
        model.update(db_tx).await?;
        Ok(())
    }

    async fn count_referrals(
        &self,
        db_tx: &DatabaseTransaction,
        referrer_account_id: Uuid,
        status: ReferralStatus,
    ) -> ResultLedger<u32> {
        let count = referral::Entity::find()
            .filter(referral::Column::ReferrerAccountId.eq(referrer_account_id.to_string()))
            .filter(referral::Column::Status.eq(status.as_str()))
            .count(db_tx)
            .await?;
        Ok(count as u32)
    }

    async fn load_tiers(&self, db_tx: &DatabaseTransaction) -> ResultLedger<Vec<ReferralTier>> {
        let mut rows: Vec<ReferralTier> = tiers::Entity::find()
            .all(db_tx)
            .await?
            .into_iter()
            .map(ReferralTier::from)
            .collect();

        if rows.is_empty() {
            rows = ReferralTier::defaults();
        }
        rows.sort_by_key(|t| t.min_referrals);
        Ok(rows)
    }
}
