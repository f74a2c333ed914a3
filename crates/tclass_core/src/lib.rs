//! Shared table-class optimizer domain primitives.
//!
//! This crate owns deterministic optimizer behavior: invocation contracts,
//! query-result row assembly, recommendation normalization, account/region
//! grouping, and report building. It intentionally excludes AWS SDK and
//! Lambda runtime concerns.

pub mod contract;
pub mod grouping;
pub mod recommendation;
pub mod report;
pub mod results;
