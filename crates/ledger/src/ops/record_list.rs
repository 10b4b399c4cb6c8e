use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{RecordKind, ResultLedger, TransactionRecord, records};

use super::{Engine, with_tx};

/// Optional narrowing for record listings.
#[derive(Clone, Debug, Default)]
pub struct RecordListFilter {
    pub kinds: Option<Vec<RecordKind>>,
    pub limit: Option<u64>,
}

impl Engine {
    /// The account's audit trail, newest first.
    pub async fn records(
        &self,
        account_id: Uuid,
        filter: &RecordListFilter,
    ) -> ResultLedger<Vec<TransactionRecord>> {
        with_tx!(self, |db_tx| {
            // Existence check keeps a typo'd id a 404 instead of an empty list.
            self.require_account_model(&db_tx, account_id).await?;

            let mut query = records::Entity::find()
                .filter(records::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(records::Column::OccurredAt);

            if let Some(kinds) = &filter.kinds {
                let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
                query = query.filter(records::Column::Kind.is_in(kinds));
            }
            if let Some(limit) = filter.limit {
                query = query.limit(limit);
            }

            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(TransactionRecord::try_from)
                .collect::<ResultLedger<Vec<_>>>()
        })
    }
}
