//! Configuration loading (YAML file plus environment overrides)

mod app_config;

pub use app_config::{AppConfig, ProgressConfig};
