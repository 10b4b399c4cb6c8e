use std::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Money amount represented as **integer minor units** (paise).
///
/// Every monetary value in the ledger (wallet balances, product prices,
/// daily yields, record amounts) uses this type; there are no floats in the
/// engine.
///
/// # Examples
///
/// ```rust
/// use ledger::MoneyMinor;
///
/// let amount = MoneyMinor::new(600_00);
/// assert_eq!(amount.minor(), 60000);
/// assert_eq!(amount.to_string(), "₹600.00");
/// ```
///
/// Parsing from user input (accepts an optional fractional part of up to two
/// digits):
///
/// ```rust
/// use ledger::MoneyMinor;
///
/// assert_eq!("600".parse::<MoneyMinor>().unwrap().minor(), 60000);
/// assert_eq!("20.5".parse::<MoneyMinor>().unwrap().minor(), 2050);
/// assert!("1.005".parse::<MoneyMinor>().is_err());
/// assert!("-5".parse::<MoneyMinor>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyMinor(i64);

impl MoneyMinor {
    pub const ZERO: MoneyMinor = MoneyMinor(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyMinor) -> Option<MoneyMinor> {
        self.0.checked_add(rhs.0).map(MoneyMinor)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyMinor) -> Option<MoneyMinor> {
        self.0.checked_sub(rhs.0).map(MoneyMinor)
    }

    /// Saturating addition, clamping at the `i64` range.
    ///
    /// Total paths (accrual) use this instead of [`MoneyMinor::checked_add`]:
    /// they have no error channel, and clamping beats wrapping a wallet
    /// negative.
    #[must_use]
    pub fn saturating_add(self, rhs: MoneyMinor) -> MoneyMinor {
        MoneyMinor(self.0.saturating_add(rhs.0))
    }

    /// Whole percentage of the amount, rounded down to the minor unit.
    ///
    /// Used for referral bonuses (`bonus_percent` of the referred user's
    /// first deposit).
    #[must_use]
    pub fn percent(self, percent: u8) -> MoneyMinor {
        MoneyMinor(self.0.saturating_mul(i64::from(percent)) / 100)
    }
}

impl fmt::Display for MoneyMinor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let rupees = abs / 100;
        let paise = abs % 100;
        write!(f, "{sign}₹{rupees}.{paise:02}")
    }
}

impl From<i64> for MoneyMinor {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyMinor> for i64 {
    fn from(value: MoneyMinor) -> Self {
        value.0
    }
}

impl Add for MoneyMinor {
    type Output = MoneyMinor;

    fn add(self, rhs: MoneyMinor) -> Self::Output {
        MoneyMinor(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyMinor {
    fn add_assign(&mut self, rhs: MoneyMinor) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyMinor {
    type Output = MoneyMinor;

    fn sub(self, rhs: MoneyMinor) -> Self::Output {
        MoneyMinor(self.0 - rhs.0)
    }
}

impl SubAssign for MoneyMinor {
    fn sub_assign(&mut self, rhs: MoneyMinor) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for MoneyMinor {
    fn sum<I: Iterator<Item = MoneyMinor>>(iter: I) -> Self {
        iter.fold(MoneyMinor::ZERO, MoneyMinor::saturating_add)
    }
}

impl FromStr for MoneyMinor {
    type Err = LedgerError;

    /// Parses a decimal rupee string into minor units.
    ///
    /// Validation rules:
    /// - non-negative (user-facing amounts are magnitudes, the ledger decides
    ///   the direction)
    /// - max 2 fractional digits (rejects `1.005`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || LedgerError::InvalidAmount("empty amount".to_string());
        let invalid = || LedgerError::InvalidAmount("invalid amount".to_string());
        let overflow = || LedgerError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }
        if trimmed.starts_with('-') {
            return Err(LedgerError::InvalidAmount(
                "amount must not be negative".to_string(),
            ));
        }

        let mut parts = trimmed.split('.');
        let rupees_str = parts.next().ok_or_else(invalid)?;
        let paise_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if rupees_str.is_empty() || !rupees_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let rupees: i64 = rupees_str.parse().map_err(|_| invalid())?;

        let paise: i64 = match paise_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => {
                        return Err(LedgerError::InvalidAmount("too many decimals".to_string()));
                    }
                }
            }
        };

        let total = rupees
            .checked_mul(100)
            .and_then(|v| v.checked_add(paise))
            .ok_or_else(overflow)?;

        Ok(MoneyMinor(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_inr() {
        assert_eq!(MoneyMinor::new(0).to_string(), "₹0.00");
        assert_eq!(MoneyMinor::new(1).to_string(), "₹0.01");
        assert_eq!(MoneyMinor::new(2050).to_string(), "₹20.50");
        assert_eq!(MoneyMinor::new(-2050).to_string(), "-₹20.50");
    }

    #[test]
    fn parse_accepts_plain_and_fractional() {
        assert_eq!("600".parse::<MoneyMinor>().unwrap().minor(), 60000);
        assert_eq!("20.5".parse::<MoneyMinor>().unwrap().minor(), 2050);
        assert_eq!("20.50".parse::<MoneyMinor>().unwrap().minor(), 2050);
        assert_eq!("  2.30 ".parse::<MoneyMinor>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_negative_and_long_fractions() {
        assert!("-5".parse::<MoneyMinor>().is_err());
        assert!("1.005".parse::<MoneyMinor>().is_err());
        assert!("".parse::<MoneyMinor>().is_err());
        assert!("abc".parse::<MoneyMinor>().is_err());
    }

    #[test]
    fn checked_and_saturating_arithmetic_at_the_ceiling() {
        let near_max = MoneyMinor::new(i64::MAX - 10);
        assert_eq!(near_max.checked_add(MoneyMinor::new(100)), None);
        assert_eq!(
            near_max.saturating_add(MoneyMinor::new(100)),
            MoneyMinor::new(i64::MAX)
        );
        assert_eq!(
            near_max.checked_add(MoneyMinor::new(10)),
            Some(MoneyMinor::new(i64::MAX))
        );
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(MoneyMinor::new(1000).percent(10), MoneyMinor::new(100));
        assert_eq!(MoneyMinor::new(999).percent(10), MoneyMinor::new(99));
        assert_eq!(MoneyMinor::new(50).percent(25), MoneyMinor::new(12));
    }
}
