//! Application layer containing the orchestration of the domain.
//!
//! `MortgageEngine` is the entry point. It wires the effective-rate catalog,
//! the rate comparator and the application lifecycle over the domain ports.

pub mod comparator;
pub mod engine;
pub mod lifecycle;
pub mod rate_catalog;
