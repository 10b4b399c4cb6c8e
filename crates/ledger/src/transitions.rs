//! The daily-income accrual and dual-wallet transition functions.
//!
//! Every operation here is a pure value transformation: it consumes an
//! [`Account`] snapshot plus an injected clock and returns a [`Transition`]
//! with the next snapshot, at most one [`TransactionRecord`] to append, and
//! whether the operation applied. No I/O happens in this module; persistence
//! and per-account serialization are the ops layer's job.
//!
//! Failure semantics: business failures the product wants on the statement
//! (withdrawing more than the earnings wallet holds) come back as
//! `applied = false` with a `failed` record. Contract violations by the
//! caller (non-positive amounts, unvalidated purchase price, selling an
//! unowned position) are [`LedgerError`]s and leave no trace.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Account, LedgerError, MoneyMinor, ResultLedger,
    position::Position,
    product::Product,
    records::{RecordDetail, RecordStatus, TransactionRecord},
};

/// Outcome of one ledger operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// The next account snapshot. Unchanged from the input when the
    /// operation did not apply.
    pub account: Account,
    /// Record to append to the audit trail, if the operation produced one.
    pub record: Option<TransactionRecord>,
    /// `false` when the operation was rejected (failed withdraw) or skipped
    /// (accrual already ran today).
    pub applied: bool,
}

fn require_positive(amount: MoneyMinor, op: &str) -> ResultLedger<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(format!(
            "{op} amount must be > 0"
        )))
    }
}

/// Wallet and lifetime-counter updates never wrap: an amount the `i64`
/// range cannot absorb is rejected like any other invalid amount.
fn require_room(total: Option<MoneyMinor>, op: &str) -> ResultLedger<MoneyMinor> {
    total.ok_or_else(|| LedgerError::InvalidAmount(format!("{op} amount overflows the ledger")))
}

/// Credit the deposit wallet.
///
/// Always succeeds for a positive amount the wallet can absorb: the deposit
/// wallet is funded, the lifetime deposit counter moves, the withdrawal
/// wallet is untouched.
pub fn deposit(
    mut account: Account,
    amount: MoneyMinor,
    upi_reference: Option<String>,
    now: DateTime<Utc>,
) -> ResultLedger<Transition> {
    require_positive(amount, "deposit")?;

    account.deposit_wallet = require_room(account.deposit_wallet.checked_add(amount), "deposit")?;
    account.total_deposited =
        require_room(account.total_deposited.checked_add(amount), "deposit")?;

    let record = TransactionRecord::new(
        account.id,
        RecordStatus::Completed,
        amount,
        now,
        RecordDetail::Deposit { upi_reference },
    );

    Ok(Transition {
        account,
        record: Some(record),
        applied: true,
    })
}

/// Debit the withdrawal wallet.
///
/// On insufficient funds the account comes back unchanged with a `failed`
/// record carrying the reason; the failure is logged on the statement, never
/// silent.
pub fn withdraw(
    mut account: Account,
    amount: MoneyMinor,
    destination: Option<String>,
    now: DateTime<Utc>,
) -> ResultLedger<Transition> {
    require_positive(amount, "withdraw")?;

    if account.withdrawal_wallet < amount {
        let record = TransactionRecord::new(
            account.id,
            RecordStatus::Failed,
            amount,
            now,
            RecordDetail::Withdraw {
                destination,
                reason: Some("insufficient balance".to_string()),
            },
        );
        return Ok(Transition {
            account,
            record: Some(record),
            applied: false,
        });
    }

    account.withdrawal_wallet =
        require_room(account.withdrawal_wallet.checked_sub(amount), "withdraw")?;
    account.total_withdrawn =
        require_room(account.total_withdrawn.checked_add(amount), "withdraw")?;

    let record = TransactionRecord::new(
        account.id,
        RecordStatus::Completed,
        amount,
        now,
        RecordDetail::Withdraw {
            destination,
            reason: None,
        },
    );

    Ok(Transition {
        account,
        record: Some(record),
        applied: true,
    })
}

/// Buy a product: debit the deposit wallet, open a position.
///
/// The contract requires the caller to have validated the price against the
/// deposit wallet; an underflow here is a caller bug, not a loggable
/// business failure.
pub fn purchase(
    mut account: Account,
    product: &Product,
    now: DateTime<Utc>,
) -> ResultLedger<Transition> {
    require_positive(product.price, "purchase")?;

    if account.deposit_wallet < product.price {
        return Err(LedgerError::InsufficientFunds(format!(
            "deposit wallet {} cannot cover {}",
            account.deposit_wallet, product.price
        )));
    }

    account.deposit_wallet = require_room(
        account.deposit_wallet.checked_sub(product.price),
        "purchase",
    )?;
    account.positions.push(Position::new(
        product.id,
        product.name.clone(),
        product.daily_yield,
        product.cycle_days,
        now,
    ));
    account.daily_income_rate = account.active_daily_rate(now);

    let record = TransactionRecord::new(
        account.id,
        RecordStatus::Completed,
        product.price,
        now,
        RecordDetail::Purchase {
            product_id: product.id,
            product_name: product.name.clone(),
            cycle_days: product.cycle_days,
        },
    );

    Ok(Transition {
        account,
        record: Some(record),
        applied: true,
    })
}

/// Close a position: sale proceeds are earnings and go to the withdrawal
/// wallet, never back into the deposit wallet.
pub fn sell(
    mut account: Account,
    position_id: Uuid,
    sell_price: MoneyMinor,
    now: DateTime<Utc>,
) -> ResultLedger<Transition> {
    let Some(index) = account.positions.iter().position(|p| p.id == position_id) else {
        return Err(LedgerError::KeyNotFound(format!(
            "position {position_id} not owned"
        )));
    };

    let position = account.positions.remove(index);
    account.withdrawal_wallet =
        require_room(account.withdrawal_wallet.checked_add(sell_price), "sale")?;
    account.daily_income_rate = account.active_daily_rate(now);

    let record = TransactionRecord::new(
        account.id,
        RecordStatus::Completed,
        sell_price,
        now,
        RecordDetail::Sale {
            position_id,
            product_name: position.product_name,
        },
    );

    Ok(Transition {
        account,
        record: Some(record),
        applied: true,
    })
}

/// Credit an approved referral bonus into the referrer's withdrawal wallet.
///
/// Bonuses are earnings, so they follow the sale-proceeds rule and never
/// touch the deposit wallet. A first deposit so small the percentage rounds
/// down to zero still applies: the approval goes through, just without a
/// wallet credit or a record.
pub fn referral_bonus(
    mut account: Account,
    referred_account_id: Uuid,
    first_deposit: MoneyMinor,
    bonus_percent: u8,
    now: DateTime<Utc>,
) -> ResultLedger<Transition> {
    let bonus = first_deposit.percent(bonus_percent);
    if !bonus.is_positive() {
        return Ok(Transition {
            account,
            record: None,
            applied: true,
        });
    }

    account.withdrawal_wallet = require_room(
        account.withdrawal_wallet.checked_add(bonus),
        "referral bonus",
    )?;

    let record = TransactionRecord::new(
        account.id,
        RecordStatus::Completed,
        bonus,
        now,
        RecordDetail::ReferralBonus {
            referred_account_id,
            bonus_percent,
        },
    );

    Ok(Transition {
        account,
        record: Some(record),
        applied: true,
    })
}

/// Run the daily income pass. Total and idempotent per UTC calendar day.
///
/// When something accrued: the sum of active yields lands in the withdrawal
/// wallet, the rate is refreshed, expired positions are pruned and
/// `last_accrual_at` moves to `now`.
///
/// When nothing is active the pass still prunes expired positions and zeroes
/// the rate but leaves `last_accrual_at` alone and emits no record, so a
/// purchase made later the same day can still accrue.
///
/// This function has no error channel, so a wallet at the numeric ceiling
/// saturates instead of wrapping.
pub fn accrue_daily_income(mut account: Account, now: DateTime<Utc>) -> Transition {
    if let Some(last) = account.last_accrual_at
        && last.date_naive() == now.date_naive()
    {
        return Transition {
            account,
            record: None,
            applied: false,
        };
    }

    let active_count = account.positions.iter().filter(|p| p.is_active(now)).count();
    let total: MoneyMinor = account
        .positions
        .iter()
        .filter(|p| p.is_active(now))
        .map(|p| p.daily_yield)
        .sum();

    account.positions.retain(|p| p.is_active(now));

    if !total.is_positive() {
        account.daily_income_rate = MoneyMinor::ZERO;
        return Transition {
            account,
            record: None,
            applied: true,
        };
    }

    account.withdrawal_wallet = account.withdrawal_wallet.saturating_add(total);
    account.daily_income_rate = total;
    account.last_accrual_at = Some(now);

    let record = TransactionRecord::new(
        account.id,
        RecordStatus::Completed,
        total,
        now,
        RecordDetail::DailyIncome {
            active_positions: active_count as u32,
        },
    );

    Transition {
        account,
        record: Some(record),
        applied: true,
    }
}
