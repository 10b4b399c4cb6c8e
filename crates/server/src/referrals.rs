//! Referral summary endpoint (the user-facing side; approvals are admin).

use api_types::referral::{ReferralSummaryView, TierView};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, account::account_id, server::ServerState};
use ledger::account as accounts;

pub async fn summary(
    Extension(model): Extension<accounts::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ReferralSummaryView>, ServerError> {
    let id = account_id(&model)?;
    let summary = state.engine.referral_summary(id).await?;

    Ok(Json(ReferralSummaryView {
        referral_code: summary.referral_code,
        approved: summary.approved,
        pending: summary.pending,
        current_tier: summary.current_tier.map(|tier| TierView {
            min_referrals: tier.min_referrals,
            max_referrals: tier.max_referrals,
            bonus_percent: tier.bonus_percent,
            reward: tier.reward,
        }),
    }))
}
