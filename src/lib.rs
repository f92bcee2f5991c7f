//! Load testing tool for a simple books REST API.
//!
//! This crate provides tools to:
//! - Drive a books API with weighted random GET/POST/DELETE traffic
//! - Track per-user created-book state so deletes target real rows
//! - Collect per-action success/failure counts and latency percentiles
//! - Optionally export a span per request via OpenTelemetry
//! - Output results in multiple formats (console, JSON, CSV)

pub mod client;
pub mod config;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod telemetry;
pub mod workload;

pub use client::BooksClient;
pub use config::{ActionWeights, Profile, TestConfig, WaitInterval};
pub use metrics::{MetricsCollector, TestResults};
pub use report::ResultsReport;
pub use runner::LoadRunner;
pub use workload::{Action, ActionPicker, Outcome, UserState};
