use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Account, LedgerError, ResultLedger, account, position};

use super::{Engine, generate_referral_code, normalize_display_name, with_tx};

impl Engine {
    /// Register a new account with zeroed wallets.
    ///
    /// `referred_by`, when given, must be an existing referral code; the
    /// referred relationship is recorded on the account and turned into a
    /// pending referral entry at first-deposit time.
    pub async fn register(
        &self,
        name: &str,
        phone: &str,
        password: &str,
        referred_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> ResultLedger<Account> {
        let name = normalize_display_name(name)?;
        let phone = phone.trim().to_string();
        if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(LedgerError::InvalidAmount(
                "phone must be numeric".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(LedgerError::InvalidAmount(
                "password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let exists = account::Entity::find()
                .filter(account::Column::Phone.eq(phone.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(LedgerError::ExistingKey(phone));
            }

            let referred_by = match referred_by.map(str::trim).filter(|s| !s.is_empty()) {
                None => None,
                Some(code) => {
                    let referrer = account::Entity::find()
                        .filter(account::Column::ReferralCode.eq(code.to_string()))
                        .one(&db_tx)
                        .await?;
                    match referrer {
                        Some(_) => Some(code.to_string()),
                        None => {
                            return Err(LedgerError::KeyNotFound(format!(
                                "referral code {code} not exists"
                            )));
                        }
                    }
                }
            };

            let account = Account::new(name, phone, generate_referral_code(), referred_by, now);
            let mut model: account::ActiveModel = (&account).into();
            model.password = ActiveValue::Set(password.to_string());
            model.is_admin = ActiveValue::Set(false);
            model.insert(&db_tx).await?;

            tracing::info!(account_id = %account.id, "registered account");
            Ok(account)
        })
    }

    /// Current account snapshot, positions included.
    pub async fn account(&self, account_id: Uuid) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| self.load_account(&db_tx, account_id).await)
    }

    /// Account lookup by phone (login identity).
    pub async fn account_by_phone(&self, phone: &str) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| {
            let model = account::Entity::find()
                .filter(account::Column::Phone.eq(phone.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::KeyNotFound("account not exists".to_string()))?;
            let id = Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("account not exists".to_string()))?;
            self.load_account(&db_tx, id).await
        })
    }

    /// Admin: every account snapshot (open positions loaded), newest first,
    /// each paired with its admin flag.
    pub async fn list_accounts(&self) -> ResultLedger<Vec<(Account, bool)>> {
        with_tx!(self, |db_tx| {
            let models = account::Entity::find()
                .order_by_desc(account::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let is_admin = model.is_admin;
                let positions = position::Entity::find()
                    .filter(position::Column::AccountId.eq(model.id.clone()))
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(crate::Position::try_from)
                    .collect::<ResultLedger<Vec<_>>>()?;
                out.push((Account::try_from((model, positions))?, is_admin));
            }
            Ok(out)
        })
    }

    /// Admin: flip the blocked flag. Blocking is a flag, never a delete.
    pub async fn set_blocked(&self, account_id: Uuid, blocked: bool) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account_model(&db_tx, account_id).await?;
            let mut active: account::ActiveModel = model.into();
            active.blocked = ActiveValue::Set(blocked);
            active.update(&db_tx).await?;
            tracing::info!(%account_id, blocked, "updated account block flag");
            Ok(())
        })
    }
}
