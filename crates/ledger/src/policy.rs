//! Accrual scheduling policy.
//!
//! The original product only credited daily income "at 9 AM". That gating is
//! a deployment policy, not a ledger invariant, so it lives here: callers
//! (the accrual sweep, the check-on-read path) ask the policy before
//! invoking the core transition. The transition itself only guarantees
//! calendar-day idempotence.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// When the caller is allowed to run the daily accrual pass.
#[derive(Clone, Copy, Debug)]
pub struct AccrualPolicy {
    /// Timezone the earliest-hour gate is evaluated in.
    pub timezone: Tz,
    /// Accrual may run only at or after this local hour. `None` disables the
    /// gate.
    pub earliest_hour: Option<u32>,
}

impl Default for AccrualPolicy {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Kolkata,
            earliest_hour: None,
        }
    }
}

impl AccrualPolicy {
    /// Returns `true` if the policy allows an accrual pass at `now`.
    #[must_use]
    pub fn permits(&self, now: DateTime<Utc>) -> bool {
        match self.earliest_hour {
            None => true,
            Some(hour) => now.with_timezone(&self.timezone).hour() >= hour,
        }
    }
}
