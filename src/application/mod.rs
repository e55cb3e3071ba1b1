//! Application layer orchestrating eligibility and tax determination.
//!
//! [`aggregator::CartAggregator`] is the entry point: one aggregation pass
//! walks the cart in order, decides deliverability per item through the
//! [`eligibility::EligibilityResolver`] (backed by a pass-scoped
//! [`cache::VisibilityCache`]) and prices eligible items through the
//! [`rules::RuleEvaluator`].

pub mod aggregator;
pub mod cache;
pub mod eligibility;
pub mod rules;
