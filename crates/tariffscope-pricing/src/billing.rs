//! Billing simulator
//!
//! Replays a consumption series against one plan's discount rule. Only
//! readings in active months are billed; each reading is priced at the base
//! rate, or at the discounted rate when its time of day falls inside the
//! plan's window.
//!
//! # Examples
//!
//! ```
//! use tariffscope_core::series::ConsumptionSeries;
//! use tariffscope_core::types::{Plan, PlanId};
//! use tariffscope_pricing::billing::BillingSimulator;
//!
//! let series = ConsumptionSeries::new(Vec::new(), 0.9).unwrap();
//! let plan = Plan {
//!     id: PlanId::new(1),
//!     provider_name: "Provider".into(),
//!     plan_name: "Evening".into(),
//!     base_rate_per_kwh: 0.5,
//!     discount_percent: 0.2,
//!     discount_window: "14:00-20:00".parse().unwrap(),
//!     provider_url: None,
//!     logo_filename: None,
//! };
//!
//! let result = BillingSimulator::simulate(&plan, &series);
//! assert_eq!(result.savings_amount, 0.0);
//! assert_eq!(result.savings_percent, 0.0);
//! ```

use tariffscope_core::aggregation_types::BillingResult;
use tariffscope_core::series::ConsumptionSeries;
use tariffscope_core::types::Plan;
use tracing::debug;

/// Prices a consumption series under a plan
pub struct BillingSimulator;

impl BillingSimulator {
    /// Simulate one plan over the active months of a series
    ///
    /// Pure function of its inputs. The plan is assumed valid; validation is
    /// the recommender's job.
    pub fn simulate(plan: &Plan, series: &ConsumptionSeries) -> BillingResult {
        let base_rate = plan.base_rate_per_kwh;
        let discounted_rate = plan.discounted_rate();

        let mut full_cost = 0.0;
        let mut plan_cost = 0.0;
        let mut total_kwh = 0.0;
        let mut discounted_kwh = 0.0;

        for reading in series.active_readings() {
            let kwh = reading.kwh;
            total_kwh += kwh;
            full_cost += kwh * base_rate;
            if plan.discount_window.contains(reading.timestamp.time_of_day()) {
                discounted_kwh += kwh;
                plan_cost += kwh * discounted_rate;
            } else {
                plan_cost += kwh * base_rate;
            }
        }

        let savings_amount = full_cost - plan_cost;
        let savings_percent = if full_cost > 0.0 {
            savings_amount / full_cost
        } else {
            0.0
        };
        let coverage = if total_kwh > 0.0 {
            discounted_kwh / total_kwh
        } else {
            0.0
        };
        let active_months = series.active_months().len();
        let monthly_savings = if active_months > 0 {
            savings_amount / active_months as f64
        } else {
            0.0
        };

        debug!(
            "Plan {}: full {:.4}, with plan {:.4}, savings {:.4} ({:.2}%)",
            plan.id,
            full_cost,
            plan_cost,
            savings_amount,
            savings_percent * 100.0
        );

        BillingResult {
            plan_id: plan.id,
            total_cost_at_full_rate: full_cost,
            total_cost_with_plan: plan_cost,
            savings_amount,
            savings_percent,
            total_kwh,
            discounted_kwh,
            coverage,
            active_months,
            monthly_savings,
        }
    }
}
