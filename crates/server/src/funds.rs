//! Deposit and withdrawal endpoints.

use api_types::funds::{DepositNew, OperationResult, WithdrawNew};
use axum::{Extension, Json, extract::State};
use chrono::Utc;

use crate::{ServerError, account::account_id, records::record_view, server::ServerState};
use ledger::{MoneyMinor, Transition, account as accounts};

pub(crate) fn operation_result(transition: &Transition) -> OperationResult {
    OperationResult {
        applied: transition.applied,
        record: transition.record.as_ref().map(record_view),
        deposit_wallet_minor: transition.account.deposit_wallet.minor(),
        withdrawal_wallet_minor: transition.account.withdrawal_wallet.minor(),
    }
}

pub async fn deposit_new(
    Extension(model): Extension<accounts::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<DepositNew>,
) -> Result<Json<OperationResult>, ServerError> {
    let id = account_id(&model)?;
    let transition = state
        .engine
        .deposit(
            id,
            MoneyMinor::new(payload.amount_minor),
            payload.upi_reference,
            Utc::now(),
        )
        .await?;

    Ok(Json(operation_result(&transition)))
}

/// A withdraw that bounces for insufficient balance is not an HTTP error:
/// it comes back `applied = false` with the failed record, mirroring the
/// statement the user will see.
pub async fn withdraw_new(
    Extension(model): Extension<accounts::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WithdrawNew>,
) -> Result<Json<OperationResult>, ServerError> {
    let id = account_id(&model)?;
    let transition = state
        .engine
        .withdraw(
            id,
            MoneyMinor::new(payload.amount_minor),
            payload.destination,
            Utc::now(),
        )
        .await?;

    Ok(Json(operation_result(&transition)))
}
