//! Aggregation data types for tariffscope
//!
//! Pure data structures produced by the normalizer and the recommender.
//! These types have no dependencies on the meter reader or the billing code.

use crate::types::{IntervalTimestamp, Plan, PlanId, YearMonth};
use serde::{Deserialize, Serialize};

/// Completeness summary for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// Calendar month
    pub month: YearMonth,
    /// Readings present in the series
    pub readings: usize,
    /// Readings a complete month holds (days × 96)
    pub expected: usize,
    /// `readings / expected`
    pub completeness: f64,
    /// Total consumption in kWh, whether or not the month is active
    pub total_kwh: f64,
    /// Whether the month met the completeness threshold
    pub active: bool,
}

/// Descriptive statistics of a consumption series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub readings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<IntervalTimestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<IntervalTimestamp>,
    pub total_kwh: f64,
    /// Mean kWh per reading, 0 for an empty series
    pub mean_kwh: f64,
}

/// Mean kWh per reading for each hour of day within one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyHourlyUsage {
    pub month: YearMonth,
    pub hours: [f64; 24],
}

/// Hour-of-day consumption profile over the latest active months
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyProfile {
    /// One entry per month, ascending
    pub months: Vec<MonthlyHourlyUsage>,
    /// Per-hour mean across `months`
    pub average: Option<[f64; 24]>,
}

/// Outcome of simulating one plan against one consumption series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingResult {
    pub plan_id: PlanId,
    /// Cost with no discount, active months only
    pub total_cost_at_full_rate: f64,
    /// Cost under the plan's discount rule
    pub total_cost_with_plan: f64,
    pub savings_amount: f64,
    /// `savings_amount / total_cost_at_full_rate`, 0 when the full cost is 0
    pub savings_percent: f64,
    /// Consumption billed, active months only
    pub total_kwh: f64,
    /// Consumption that fell inside the discount window
    pub discounted_kwh: f64,
    /// `discounted_kwh / total_kwh`, 0 when nothing was consumed
    pub coverage: f64,
    /// Number of active months simulated
    pub active_months: usize,
    /// Savings averaged over the active months
    pub monthly_savings: f64,
}

/// One ranked plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlan {
    /// 1-based position in the ranking
    pub rank: usize,
    pub plan: Plan,
    pub result: BillingResult,
}

/// A catalog entry left out of the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedPlan {
    pub plan_id: PlanId,
    pub reason: String,
}

/// Plans ordered by savings
///
/// Sorted by savings amount descending, then savings percent descending,
/// then plan id ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub entries: Vec<RankedPlan>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rejected: Vec<RejectedPlan>,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The plan with the largest savings, if any
    pub fn best(&self) -> Option<&RankedPlan> {
        self.entries.first()
    }
}

/// Calculate totals across a ranking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Totals {
    pub plans: usize,
    pub rejected: usize,
    pub best_savings: f64,
    pub best_monthly_savings: f64,
}

impl Totals {
    pub fn from_ranking(ranking: &Ranking) -> Self {
        let (best_savings, best_monthly_savings) = ranking
            .best()
            .map(|best| (best.result.savings_amount, best.result.monthly_savings))
            .unwrap_or_default();
        Self {
            plans: ranking.len(),
            rejected: ranking.rejected.len(),
            best_savings,
            best_monthly_savings,
        }
    }
}
