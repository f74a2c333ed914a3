//! AWS-oriented adapters and handlers for the table-class optimizer Lambda.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! Athena/STS/DynamoDB/SES seams, and report publishing) on top of the
//! deterministic primitives in `tclass_core`.

pub mod adapters;
pub mod handlers;
