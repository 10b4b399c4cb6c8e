//! Registration and account snapshot endpoints.

use api_types::account::{AccountView, PositionView, Register};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use ledger::{Account, account as accounts};

pub(crate) fn account_view(account: &Account, now: chrono::DateTime<Utc>) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name.clone(),
        phone: account.phone.clone(),
        referral_code: account.referral_code.clone(),
        deposit_wallet_minor: account.deposit_wallet.minor(),
        withdrawal_wallet_minor: account.withdrawal_wallet.minor(),
        total_deposited_minor: account.total_deposited.minor(),
        total_withdrawn_minor: account.total_withdrawn.minor(),
        daily_income_rate_minor: account.daily_income_rate.minor(),
        last_accrual_at: account.last_accrual_at,
        positions: account
            .positions
            .iter()
            .map(|p| PositionView {
                id: p.id,
                product_id: p.product_id,
                product_name: p.product_name.clone(),
                daily_yield_minor: p.daily_yield.minor(),
                cycle_days: p.cycle_days,
                purchased_at: p.purchased_at,
                days_held: p.days_held(now),
                active: p.is_active(now),
            })
            .collect(),
    }
}

pub(crate) fn account_id(model: &accounts::Model) -> Result<Uuid, ServerError> {
    Uuid::parse_str(&model.id)
        .map_err(|_| ServerError::Generic("malformed account id".to_string()))
}

/// Open registration. The only unauthenticated endpoint.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let now = Utc::now();
    let account = state
        .engine
        .register(
            &payload.name,
            &payload.phone,
            &payload.password,
            payload.referral_code.as_deref(),
            now,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(account_view(&account, now))))
}

/// Account snapshot with check-on-read accrual: serving the profile first
/// runs the daily income pass (policy permitting), so a user opening the app
/// always sees today's income without a separate scheduler tick.
pub async fn get(
    Extension(model): Extension<accounts::Model>,
    State(state): State<ServerState>,
) -> Result<Json<AccountView>, ServerError> {
    let now = Utc::now();
    let id = account_id(&model)?;

    let transition = state.engine.accrue(id, &state.accrual_policy, now).await?;
    Ok(Json(account_view(&transition.account, now)))
}
