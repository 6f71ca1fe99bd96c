//! Trippe gateway library
//!
//! Registration-email proxy, nearby-content aggregation, and booking
//! lookups. Exposes modules for integration testing and binary reuse.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
