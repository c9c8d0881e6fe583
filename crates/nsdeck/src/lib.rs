pub mod cli;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod grafana;
pub mod tracing;
