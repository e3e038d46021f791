//! Core domain types for tariffscope
//!
//! This module contains the fundamental types shared by the normalizer and the
//! recommendation engine: interval-aligned timestamps, calendar months,
//! readings, discount windows, and plans.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TariffscopeError};

/// Length of one meter interval in minutes
pub const INTERVAL_MINUTES: u32 = 15;

/// Number of meter intervals in one day
pub const INTERVALS_PER_DAY: u32 = 96;

/// Strongly-typed plan identifier
///
/// Plans are ordered by id when every other ranking key ties.
///
/// # Examples
/// ```
/// use tariffscope_core::types::PlanId;
///
/// let id = PlanId::new(7);
/// assert_eq!(id.get(), 7);
/// assert_eq!(id.to_string(), "#7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(u32);

impl PlanId {
    /// Create a new PlanId
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Wall-clock timestamp on a 15-minute boundary
///
/// Meter exports record local wall-clock time, so no timezone is attached.
/// Construction fails for anything off the interval grid.
///
/// # Examples
/// ```
/// use tariffscope_core::types::IntervalTimestamp;
/// use chrono::NaiveDate;
///
/// let dt = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap().and_hms_opt(23, 45, 0).unwrap();
/// assert!(IntervalTimestamp::new(dt).is_some());
///
/// let off_grid = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap().and_hms_opt(23, 50, 0).unwrap();
/// assert!(IntervalTimestamp::new(off_grid).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "NaiveDateTime", into = "NaiveDateTime")]
pub struct IntervalTimestamp(NaiveDateTime);

impl IntervalTimestamp {
    /// Create a new IntervalTimestamp, or `None` when `dt` is off the grid
    pub fn new(dt: NaiveDateTime) -> Option<Self> {
        Self::is_aligned(&dt).then_some(Self(dt))
    }

    /// Whether a datetime sits exactly on a 15-minute boundary
    pub fn is_aligned(dt: &NaiveDateTime) -> bool {
        dt.minute() % INTERVAL_MINUTES == 0 && dt.second() == 0 && dt.nanosecond() == 0
    }

    /// Get the inner NaiveDateTime
    pub fn inner(&self) -> &NaiveDateTime {
        &self.0
    }

    /// Calendar month this timestamp belongs to
    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.0.date())
    }

    /// Time of day, ignoring the date
    pub fn time_of_day(&self) -> NaiveTime {
        self.0.time()
    }
}

impl TryFrom<NaiveDateTime> for IntervalTimestamp {
    type Error = TariffscopeError;

    fn try_from(dt: NaiveDateTime) -> Result<Self> {
        Self::new(dt).ok_or_else(|| {
            TariffscopeError::InvalidArgument(format!("{dt} is not on a 15-minute boundary"))
        })
    }
}

impl From<IntervalTimestamp> for NaiveDateTime {
    fn from(ts: IntervalTimestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for IntervalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

/// Calendar month used for completeness bookkeeping
///
/// Serialized as `YYYY-MM`.
///
/// # Examples
/// ```
/// use tariffscope_core::types::YearMonth;
///
/// let feb = YearMonth::new(2024, 2).unwrap();
/// assert_eq!(feb.days_in_month(), 29);
/// assert_eq!(feb.expected_intervals(), 29 * 96);
/// assert_eq!(feb.to_string(), "2024-02");
/// assert_eq!("2024-02".parse::<YearMonth>().unwrap(), feb);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a new YearMonth, or `None` for an invalid month
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Month containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Number of days in this month
    pub fn days_in_month(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        match (
            NaiveDate::from_ymd_opt(self.year, self.month, 1),
            NaiveDate::from_ymd_opt(next_year, next_month, 1),
        ) {
            (Some(first), Some(next)) => (next - first).num_days() as u32,
            _ => 31,
        }
    }

    /// Number of 15-minute intervals a complete month holds
    pub fn expected_intervals(&self) -> usize {
        (self.days_in_month() * INTERVALS_PER_DAY) as usize
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = TariffscopeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TariffscopeError::InvalidArgument(format!("invalid month '{s}'"));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One normalized consumption sample
///
/// `kwh` is the consumption of the 15-minute interval starting at
/// `timestamp`, as labelled by the export. Timestamps are never shifted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: IntervalTimestamp,
    pub kwh: f64,
}

impl Reading {
    pub fn new(timestamp: IntervalTimestamp, kwh: f64) -> Self {
        Self { timestamp, kwh }
    }

    pub fn year_month(&self) -> YearMonth {
        self.timestamp.year_month()
    }
}

/// Recurring daily time-of-day range in which a plan's discount applies
///
/// The start is inclusive and the end exclusive. A window whose start is later
/// than its end wraps past midnight.
///
/// # Examples
/// ```
/// use tariffscope_core::types::DiscountWindow;
/// use chrono::NaiveTime;
///
/// let night: DiscountWindow = "23:00-07:00".parse().unwrap();
/// assert!(night.wraps_midnight());
/// assert!(night.contains(NaiveTime::from_hms_opt(23, 5, 0).unwrap()));
/// assert!(night.contains(NaiveTime::from_hms_opt(6, 55, 0).unwrap()));
/// assert!(!night.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DiscountWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether the window runs past midnight
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether the window is the catalog's `00:00-23:59` whole-day form
    pub fn is_all_day(&self) -> bool {
        self.start == NaiveTime::MIN
            && self.end.hour() == 23
            && self.end.minute() == 59
    }

    /// Whether a time of day falls inside the window
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.wraps_midnight() {
            time >= self.start || time < self.end
        } else {
            self.start <= time && time < self.end
        }
    }
}

impl fmt::Display for DiscountWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl FromStr for DiscountWindow {
    type Err = TariffscopeError;

    /// Parse the catalog's `HH:MM-HH:MM` form
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s.trim().split_once('-').ok_or_else(|| {
            TariffscopeError::InvalidArgument(format!("invalid time range '{s}'"))
        })?;
        Ok(Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?))
    }
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| TariffscopeError::InvalidArgument(format!("invalid time of day '{s}'")))
}

/// A time-of-use electricity plan from the catalog
///
/// Plans arrive unvalidated; the recommender calls [`Plan::validate`] and
/// drops offenders from the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub provider_name: String,
    pub plan_name: String,
    /// Undiscounted price per kWh
    pub base_rate_per_kwh: f64,
    /// Fraction taken off the base rate inside the window
    pub discount_percent: f64,
    pub discount_window: DiscountWindow,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub provider_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub logo_filename: Option<String>,
}

impl Plan {
    /// Check the plan invariants
    ///
    /// # Errors
    ///
    /// Returns `InvalidPlan` when the discount is outside (0, 1) or the
    /// window has zero width.
    pub fn validate(&self) -> Result<()> {
        if !(self.discount_percent > 0.0 && self.discount_percent < 1.0) {
            return Err(TariffscopeError::InvalidPlan {
                id: self.id,
                reason: format!(
                    "discount {} is outside the open range (0, 1)",
                    self.discount_percent
                ),
            });
        }
        if self.discount_window.start == self.discount_window.end {
            return Err(TariffscopeError::InvalidPlan {
                id: self.id,
                reason: format!(
                    "discount window {} starts and ends at the same time",
                    self.discount_window
                ),
            });
        }
        Ok(())
    }

    /// Price per kWh inside the discount window
    pub fn discounted_rate(&self) -> f64 {
        self.base_rate_per_kwh * (1.0 - self.discount_percent)
    }
}
