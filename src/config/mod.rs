//! Configuration management for orphanage

pub mod config;
pub mod controller;
pub mod scan;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use config::{expand_path, Config};
pub use controller::{BackoffConfig, ControllerConfig};
pub use scan::{OutputFormat, ScanConfig};
