//! Retention window arithmetic
//!
//! Every run works on a single [`Cadence`]. The cadence decides how far back
//! the cutoff date sits and which `backup` tag value the run may purge.
//!
//! | Cadence | Cutoff                                   |
//! |---------|------------------------------------------|
//! | daily   | `today - daily` days                     |
//! | weekly  | `today - weekly * 7` days                |
//! | monthly | `today - monthly` calendar months        |
//!
//! Month subtraction keeps the day of month when the target month has it and
//! clamps to the last day otherwise, so March 31 minus one month is February
//! 29 in a leap year and February 28 in any other. Leap years follow the
//! Gregorian calendar.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::defaults;
use crate::errors::RetentionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    /// Value of the `backup` tag for snapshots of this cadence
    pub fn as_tag(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for Cadence {
    type Err = RetentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(RetentionError::InvalidCadence(other.to_string())),
        }
    }
}

/// How many units of each cadence to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Days of daily snapshots
    #[serde(default = "default_daily")]
    pub daily: u32,
    /// Weeks of weekly snapshots
    #[serde(default = "default_weekly")]
    pub weekly: u32,
    /// Calendar months of monthly snapshots
    #[serde(default = "default_monthly")]
    pub monthly: u32,
}

fn default_daily() -> u32 {
    defaults::RETAIN_DAILY_DAYS
}

fn default_weekly() -> u32 {
    defaults::RETAIN_WEEKLY_WEEKS
}

fn default_monthly() -> u32 {
    defaults::RETAIN_MONTHLY_MONTHS
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            daily: default_daily(),
            weekly: default_weekly(),
            monthly: default_monthly(),
        }
    }
}

impl RetentionPolicy {
    /// Configured count for a cadence, in that cadence's unit
    pub fn count_for(&self, cadence: Cadence) -> u32 {
        match cadence {
            Cadence::Daily => self.daily,
            Cadence::Weekly => self.weekly,
            Cadence::Monthly => self.monthly,
        }
    }
}

/// Subtract whole calendar months, clamping the day to the target month's length
pub fn month_subtract(date: NaiveDate, months: u32) -> Result<NaiveDate, RetentionError> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| RetentionError::OutOfRange(format!("{} minus {} months", date, months)))
}

fn day_subtract(date: NaiveDate, days: u64) -> Result<NaiveDate, RetentionError> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| RetentionError::OutOfRange(format!("{} minus {} days", date, days)))
}

/// Earliest date a snapshot of `cadence` may carry and still be kept.
///
/// Snapshots dated strictly before the returned date are expired.
pub fn cutoff_date(
    cadence: Cadence,
    today: NaiveDate,
    policy: &RetentionPolicy,
) -> Result<NaiveDate, RetentionError> {
    let count = policy.count_for(cadence);
    match cadence {
        Cadence::Daily => day_subtract(today, u64::from(count)),
        Cadence::Weekly => day_subtract(today, u64::from(count) * 7),
        Cadence::Monthly => month_subtract(today, count),
    }
}
