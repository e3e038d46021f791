//! Plan recommendation engine
//!
//! Ranks every valid catalog plan by how much it would have saved on a
//! consumption series. Invalid plans are left out of the ranking and listed
//! in [`Ranking::rejected`].
//!
//! # Examples
//!
//! ```
//! use tariffscope_core::series::ConsumptionSeries;
//! use tariffscope_pricing::recommender::Recommender;
//!
//! let series = ConsumptionSeries::new(Vec::new(), 0.9).unwrap();
//! let ranking = Recommender::new().rank(&series, &[]);
//! assert!(ranking.is_empty());
//! ```

use std::cmp::Ordering;

use rayon::prelude::*;
use tariffscope_core::aggregation_types::{BillingResult, RankedPlan, Ranking, RejectedPlan};
use tariffscope_core::error::TariffscopeError;
use tariffscope_core::series::ConsumptionSeries;
use tariffscope_core::types::Plan;
use tracing::{info, warn};

use crate::billing::BillingSimulator;

/// Ranks plans against a consumption series
#[derive(Debug, Clone, Copy)]
pub struct Recommender {
    parallel: bool,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new()
    }
}

impl Recommender {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Evaluate plans on the rayon pool or sequentially
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Rank plans by savings
    ///
    /// Order is savings amount descending, then savings percent descending,
    /// then plan id ascending. The result does not depend on `parallel`.
    pub fn rank(&self, series: &ConsumptionSeries, plans: &[Plan]) -> Ranking {
        let mut valid = Vec::with_capacity(plans.len());
        let mut rejected = Vec::new();
        for plan in plans {
            match plan.validate() {
                Ok(()) => valid.push(plan),
                Err(TariffscopeError::InvalidPlan { id, reason }) => {
                    warn!("Skipping plan {} ({}): {}", id, plan.plan_name, reason);
                    rejected.push(RejectedPlan {
                        plan_id: id,
                        reason,
                    });
                }
                Err(e) => {
                    warn!("Skipping plan {}: {}", plan.id, e);
                    rejected.push(RejectedPlan {
                        plan_id: plan.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut scored: Vec<(&Plan, BillingResult)> = if self.parallel {
            valid
                .par_iter()
                .map(|plan| (*plan, BillingSimulator::simulate(plan, series)))
                .collect()
        } else {
            valid
                .iter()
                .map(|plan| (*plan, BillingSimulator::simulate(plan, series)))
                .collect()
        };

        scored.sort_by(|(a_plan, a), (b_plan, b)| compare_results(a_plan, a, b_plan, b));

        let entries: Vec<RankedPlan> = scored
            .into_iter()
            .enumerate()
            .map(|(idx, (plan, result))| RankedPlan {
                rank: idx + 1,
                plan: plan.clone(),
                result,
            })
            .collect();

        info!(
            "Ranked {} plans ({} rejected)",
            entries.len(),
            rejected.len()
        );
        Ranking { entries, rejected }
    }
}

fn compare_results(a_plan: &Plan, a: &BillingResult, b_plan: &Plan, b: &BillingResult) -> Ordering {
    b.savings_amount
        .total_cmp(&a.savings_amount)
        .then_with(|| b.savings_percent.total_cmp(&a.savings_percent))
        .then_with(|| a_plan.id.cmp(&b_plan.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{approx, day_series, month_series, plan};
    use tariffscope_core::types::PlanId;

    fn ids(ranking: &Ranking) -> Vec<u32> {
        ranking.entries.iter().map(|e| e.plan.id.get()).collect()
    }

    #[test]
    fn test_orders_by_savings() {
        let series = day_series(1.0);
        let plans = vec![
            plan(1, 0.5, 0.1, "14:00-20:00"),
            plan(2, 0.5, 0.2, "14:00-20:00"),
            plan(3, 0.5, 0.04, "00:00-23:59"),
        ];
        let ranking = Recommender::new().rank(&series, &plans);

        assert_eq!(ids(&ranking), vec![2, 3, 1]);
        assert_eq!(
            ranking.entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(approx(ranking.best().unwrap().result.savings_amount, 2.4));
    }

    #[test]
    fn test_ties_break_on_percent_then_id() {
        let series = day_series(1.0);
        // Equal savings of 3.0; the cheaper base rate saves a larger share
        let plans = vec![
            plan(5, 0.5, 0.25, "14:00-20:00"),
            plan(4, 0.5, 0.25, "14:00-20:00"),
            plan(3, 1.0, 0.125, "14:00-20:00"),
        ];
        let ranking = Recommender::new().rank(&series, &plans);
        assert_eq!(ids(&ranking), vec![4, 5, 3]);
    }

    #[test]
    fn test_invalid_plans_are_rejected() {
        let series = day_series(1.0);
        let plans = vec![
            plan(1, 0.5, 0.2, "14:00-20:00"),
            plan(2, 0.5, 0.0, "14:00-20:00"),
            plan(3, 0.5, 1.0, "14:00-20:00"),
            plan(4, 0.5, 0.2, "09:00-09:00"),
        ];
        let ranking = Recommender::new().rank(&series, &plans);

        assert_eq!(ids(&ranking), vec![1]);
        let rejected: Vec<PlanId> = ranking.rejected.iter().map(|r| r.plan_id).collect();
        assert_eq!(rejected, vec![PlanId::new(2), PlanId::new(3), PlanId::new(4)]);
    }

    #[test]
    fn test_zero_consumption_keeps_every_plan() {
        let series = day_series(0.0);
        let plans: Vec<Plan> = (1..=4).map(|id| plan(id, 0.5, 0.1, "14:00-20:00")).collect();
        let ranking = Recommender::new().rank(&series, &plans);

        assert_eq!(ranking.len(), 4);
        assert_eq!(ids(&ranking), vec![1, 2, 3, 4]);
        assert!(ranking.entries.iter().all(|e| e.result.savings_amount == 0.0));
    }

    #[test]
    fn test_empty_catalog() {
        let ranking = Recommender::new().rank(&month_series(2024, 1, 1.0), &[]);
        assert!(ranking.is_empty());
        assert!(ranking.rejected.is_empty());
        assert!(ranking.best().is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let series = month_series(2024, 3, 0.7);
        let plans: Vec<Plan> = (1..=20)
            .map(|id| {
                let start = id % 24;
                let end = (id * 5) % 24;
                let window = format!("{start:02}:00-{end:02}:30");
                plan(id, 0.6, id as f64 / 25.0, &window)
            })
            .collect();

        let parallel = Recommender::new().rank(&series, &plans);
        let sequential = Recommender::new().with_parallel(false).rank(&series, &plans);
        assert_eq!(parallel, sequential);
    }
}
