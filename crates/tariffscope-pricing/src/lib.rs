//! Billing simulator, plan catalog and recommendation engine for tariffscope
//!
//! This crate loads time-of-use plan catalogs, prices consumption series
//! under each plan, and ranks the plans by savings.

pub mod billing;
pub mod catalog;
pub mod recommender;

#[cfg(test)]
mod test_utils;

pub use billing::BillingSimulator;
pub use catalog::PlanCatalog;
pub use recommender::Recommender;
