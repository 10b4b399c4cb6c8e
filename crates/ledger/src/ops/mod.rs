use sea_orm::{DatabaseConnection, DatabaseTransaction, QueryFilter, prelude::*};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Account, LedgerError, ResultLedger, Transition, account, position, records};

mod accounts;
mod accrual;
mod funds;
mod positions;
mod products;
mod record_list;
mod referrals;

pub use record_list::RecordListFilter;
pub use referrals::ReferralSummary;

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Async persistence wrapper around the pure ledger transitions.
///
/// Every operation loads the account snapshot, applies a transition from
/// [`crate::transitions`], and persists the result inside one database
/// transaction. Running each operation in its own DB transaction is what
/// serializes concurrent calls against the same account.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) async fn require_account_model(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultLedger<account::Model> {
        account::Entity::find_by_id(account_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("account not exists".to_string()))
    }

    /// Load the full account snapshot (row + open positions).
    pub(crate) async fn load_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultLedger<Account> {
        let model = self.require_account_model(db_tx, account_id).await?;
        let positions = position::Entity::find()
            .filter(position::Column::AccountId.eq(model.id.clone()))
            .all(db_tx)
            .await?
            .into_iter()
            .map(crate::Position::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;

        Account::try_from((model, positions))
    }

    /// Write back the account row and append the transition's record, if any.
    ///
    /// Position rows are managed by the individual ops (purchase inserts,
    /// sell deletes, accrual prunes); this helper only covers what every
    /// transition shares.
    pub(crate) async fn persist_transition(
        &self,
        db_tx: &DatabaseTransaction,
        transition: &Transition,
    ) -> ResultLedger<()> {
        if transition.applied {
            let model: account::ActiveModel = (&transition.account).into();
            model.update(db_tx).await?;
        }
        if let Some(record) = &transition.record {
            let record_model: records::ActiveModel = record.try_into()?;
            record_model.insert(db_tx).await?;
        }
        Ok(())
    }
}

/// Engine-level backstop for blocked accounts: the API's auth layer already
/// turns them away, but money must not move for a blocked account no matter
/// which surface asks.
pub(crate) fn require_unblocked(account: &Account) -> ResultLedger<()> {
    if account.blocked {
        return Err(LedgerError::Blocked(account.phone.clone()));
    }
    Ok(())
}

pub(crate) fn normalize_display_name(value: &str) -> ResultLedger<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(LedgerError::InvalidAmount(
            "display name must not be empty".to_string(),
        ));
    }
    Ok(normalized)
}

/// Short human-shareable referral code derived from a fresh UUID.
pub(crate) fn generate_referral_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_ascii_uppercase()
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultLedger<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_codes_are_short_and_uppercase() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn display_name_is_trimmed() {
        assert_eq!(normalize_display_name("  Asha ").unwrap(), "Asha");
        assert!(normalize_display_name("   ").is_err());
    }
}
