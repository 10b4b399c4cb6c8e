//! Admin surface: account management and referral approvals.
//!
//! Every handler here sits behind both the Basic-Auth layer and the
//! `require_admin` gate.

use api_types::{
    admin::{AccountListResponse, AccountSummary, BlockUpdate, ReferralListResponse, ReferralView},
    funds::OperationResult,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, funds::operation_result, server::ServerState};

pub async fn list_accounts(
    State(state): State<ServerState>,
) -> Result<Json<AccountListResponse>, ServerError> {
    let accounts = state.engine.list_accounts().await?;

    Ok(Json(AccountListResponse {
        accounts: accounts
            .into_iter()
            .map(|(account, is_admin)| AccountSummary {
                id: account.id,
                name: account.name,
                phone: account.phone,
                deposit_wallet_minor: account.deposit_wallet.minor(),
                withdrawal_wallet_minor: account.withdrawal_wallet.minor(),
                total_deposited_minor: account.total_deposited.minor(),
                total_withdrawn_minor: account.total_withdrawn.minor(),
                open_positions: account.positions.len(),
                blocked: account.blocked,
                is_admin,
            })
            .collect(),
    }))
}

pub async fn set_blocked(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BlockUpdate>,
) -> Result<StatusCode, ServerError> {
    state.engine.set_blocked(id, payload.blocked).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_pending_referrals(
    State(state): State<ServerState>,
) -> Result<Json<ReferralListResponse>, ServerError> {
    let referrals = state.engine.pending_referrals().await?;

    Ok(Json(ReferralListResponse {
        referrals: referrals
            .into_iter()
            .map(|r| ReferralView {
                id: r.id,
                referrer_account_id: r.referrer_account_id,
                referred_account_id: r.referred_account_id,
                first_deposit_minor: r.first_deposit.minor(),
                created_at: r.created_at,
            })
            .collect(),
    }))
}

/// Approving credits the referrer's withdrawal wallet; the response carries
/// the bonus record so the admin UI can show what was paid.
pub async fn approve_referral(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OperationResult>, ServerError> {
    let transition = state.engine.approve_referral(id, Utc::now()).await?;
    Ok(Json(operation_result(&transition)))
}

pub async fn reject_referral(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.reject_referral(id, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}
