//! dualroute - routing and resilience for dual-path model execution
//!
//! This library picks between a low-latency direct path and a feature-rich
//! broker path for each operation, executes with circuit breaking, health
//! gating and budget-bounded failover, and retunes its own parameters from
//! observed outcomes.
//!
//! Start with [`engine::EngineBuilder`].

pub mod analysis;
pub mod circuit;
pub mod cli;
pub mod config;
pub mod engine;
pub mod executor;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod optimizer;
pub mod registry;
pub mod routing;
pub mod samples;
pub mod sink;
