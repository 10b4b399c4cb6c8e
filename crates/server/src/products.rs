//! Product catalog, purchase and sale endpoints.

use api_types::{
    funds::OperationResult,
    product::{ProductView, PurchaseNew, SellNew},
};
use axum::{Extension, Json, extract::State};
use chrono::Utc;

use crate::{ServerError, account::account_id, funds::operation_result, server::ServerState};
use ledger::account as accounts;

pub async fn list(
    Extension(_): Extension<accounts::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ProductView>>, ServerError> {
    let products = state.engine.products().await?;

    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductView {
                id: p.id,
                name: p.name,
                price_minor: p.price.minor(),
                daily_yield_minor: p.daily_yield.minor(),
                cycle_days: p.cycle_days,
                resale_value_minor: p.resale_value.minor(),
            })
            .collect(),
    ))
}

pub async fn purchase_new(
    Extension(model): Extension<accounts::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseNew>,
) -> Result<Json<OperationResult>, ServerError> {
    let id = account_id(&model)?;
    let transition = state
        .engine
        .purchase(id, payload.product_id, Utc::now())
        .await?;

    Ok(Json(operation_result(&transition)))
}

pub async fn sell_new(
    Extension(model): Extension<accounts::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SellNew>,
) -> Result<Json<OperationResult>, ServerError> {
    let id = account_id(&model)?;
    let transition = state
        .engine
        .sell(id, payload.position_id, Utc::now())
        .await?;

    Ok(Json(operation_result(&transition)))
}
