//! Infrastructure - configuration, logging, and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, env overrides, defaults)
//! - `logging` - tracing subscriber setup
//! - `metrics` - Lock-free counters for the email proxy

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::Config;
pub use metrics::{DispatchOutcome, Metrics};
