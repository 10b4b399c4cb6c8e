//! Transaction record endpoints: listing and CSV statement export.

use api_types::record::{
    RecordKind as ApiKind, RecordList, RecordListResponse, RecordStatus as ApiStatus, RecordView,
};
use axum::{
    Extension,
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{ServerError, account::account_id, server::ServerState};
use ledger::{RecordDetail, RecordKind, RecordListFilter, RecordStatus, TransactionRecord,
    account as accounts};

fn map_kind(kind: RecordKind) -> ApiKind {
    match kind {
        RecordKind::Deposit => ApiKind::Deposit,
        RecordKind::Withdraw => ApiKind::Withdraw,
        RecordKind::Purchase => ApiKind::Purchase,
        RecordKind::Sale => ApiKind::Sale,
        RecordKind::DailyIncome => ApiKind::DailyIncome,
        RecordKind::ReferralBonus => ApiKind::ReferralBonus,
    }
}

fn unmap_kind(kind: ApiKind) -> RecordKind {
    match kind {
        ApiKind::Deposit => RecordKind::Deposit,
        ApiKind::Withdraw => RecordKind::Withdraw,
        ApiKind::Purchase => RecordKind::Purchase,
        ApiKind::Sale => RecordKind::Sale,
        ApiKind::DailyIncome => RecordKind::DailyIncome,
        ApiKind::ReferralBonus => RecordKind::ReferralBonus,
    }
}

fn map_status(status: RecordStatus) -> ApiStatus {
    match status {
        RecordStatus::Completed => ApiStatus::Completed,
        RecordStatus::Pending => ApiStatus::Pending,
        RecordStatus::Failed => ApiStatus::Failed,
    }
}

/// One display line per kind-specific payload.
fn detail_line(detail: &RecordDetail) -> String {
    match detail {
        RecordDetail::Deposit { upi_reference } => match upi_reference {
            Some(reference) => format!("deposit via UPI {reference}"),
            None => "deposit".to_string(),
        },
        RecordDetail::Withdraw {
            destination,
            reason,
        } => {
            let mut line = match destination {
                Some(dest) => format!("withdraw to {dest}"),
                None => "withdraw".to_string(),
            };
            if let Some(reason) = reason {
                line.push_str(&format!(" ({reason})"));
            }
            line
        }
        RecordDetail::Purchase {
            product_name,
            cycle_days,
            ..
        } => format!("bought {product_name} ({cycle_days} day cycle)"),
        RecordDetail::Sale { product_name, .. } => format!("sold {product_name}"),
        RecordDetail::DailyIncome { active_positions } => {
            format!("daily income from {active_positions} position(s)")
        }
        RecordDetail::ReferralBonus { bonus_percent, .. } => {
            format!("referral bonus ({bonus_percent}%)")
        }
    }
}

pub(crate) fn record_view(record: &TransactionRecord) -> RecordView {
    RecordView {
        id: record.id,
        kind: map_kind(record.kind),
        status: map_status(record.status),
        amount_minor: record.amount.minor(),
        occurred_at: record.occurred_at,
        detail: detail_line(&record.detail),
    }
}

pub async fn list(
    Extension(model): Extension<accounts::Model>,
    State(state): State<ServerState>,
    payload: Option<Json<RecordList>>,
) -> Result<Json<RecordListResponse>, ServerError> {
    let id = account_id(&model)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let filter = RecordListFilter {
        kinds: payload
            .kinds
            .map(|kinds| kinds.into_iter().map(unmap_kind).collect()),
        limit: Some(payload.limit.unwrap_or(50)),
    };

    let records = state.engine.records(id, &filter).await?;
    Ok(Json(RecordListResponse {
        records: records.iter().map(record_view).collect(),
    }))
}

/// Full statement as `text/csv`, newest first.
pub async fn export_csv(
    Extension(model): Extension<accounts::Model>,
    State(state): State<ServerState>,
) -> Result<impl IntoResponse, ServerError> {
    let id = account_id(&model)?;
    let records = state.engine.records(id, &RecordListFilter::default()).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["id", "kind", "status", "amount_minor", "occurred_at", "detail"])
        .map_err(|err| ServerError::Generic(format!("csv error: {err}")))?;
    for record in &records {
        writer
            .write_record([
                record.id.to_string(),
                record.kind.as_str().to_string(),
                record.status.as_str().to_string(),
                record.amount.minor().to_string(),
                record.occurred_at.to_rfc3339(),
                detail_line(&record.detail),
            ])
            .map_err(|err| ServerError::Generic(format!("csv error: {err}")))?;
    }

    let body = writer
        .into_inner()
        .map_err(|err| ServerError::Generic(format!("csv error: {err}")))?;
    let body = String::from_utf8(body)
        .map_err(|err| ServerError::Generic(format!("csv error: {err}")))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv")],
        body,
    ))
}
