//! Nivesh ledger engine.
//!
//! The core of the crate is a small state-transition system over an
//! [`Account`] value: deposits and withdrawals against the dual wallets,
//! product purchases and sales, and the daily-income accrual pass. The
//! transitions themselves live in [`transitions`] and are pure (value in,
//! value out, injected clock); the async [`Engine`] in `ops` wraps them with
//! persistence and per-account serialization.

pub use account::Account;
pub use error::LedgerError;
pub use money::MoneyMinor;
pub use ops::{Engine, EngineBuilder, RecordListFilter, ReferralSummary};
pub use policy::AccrualPolicy;
pub use position::Position;
pub use product::{Product, ProductCatalog};
pub use records::{RecordDetail, RecordKind, RecordStatus, TransactionRecord};
pub use referral::{Referral, ReferralStatus, ReferralTier};
pub use transitions::Transition;

pub mod account;
mod error;
mod money;
mod ops;
mod policy;
pub mod position;
pub mod product;
pub mod records;
pub mod referral;
pub mod transitions;

type ResultLedger<T> = Result<T, LedgerError>;
