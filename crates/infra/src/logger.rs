//! Logging infrastructure for ClawSearch
//!
//! This module provides centralized logging configuration using the
//! tracing ecosystem.

use clawsearch_core::{ClawError, Result};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to use JSON format
    pub json_format: bool,
    /// Whether to include timestamps
    pub with_timestamps: bool,
    /// Whether to include file/line information
    pub with_file_info: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamps: true,
            with_file_info: false,
        }
    }
}

/// Initialize the global logger with the given configuration
pub fn init_logger(config: LoggerConfig) -> Result<()> {
    let level = LogLevel::parse(&config.level)?;

    let mut env_filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn", "redis=warn"] {
        let directive = directive
            .parse()
            .map_err(|e| ClawError::validation(format!("Invalid log directive: {}", e)))?;
        env_filter = env_filter.add_directive(directive);
    }

    let fmt_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info)
            .boxed()
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info);

        if config.with_timestamps {
            layer.boxed()
        } else {
            layer.without_time().boxed()
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ClawError::validation(format!("Failed to initialize logger: {}", e)))?;

    tracing::info!("Logger initialized with level: {}", config.level);
    Ok(())
}

/// Initialize logger for testing (reduces noise)
pub fn init_test_logger() -> Result<()> {
    let config = LoggerConfig {
        level: "warn".to_string(),
        with_timestamps: false,
        ..Default::default()
    };

    // Ignore errors if already initialized
    let _ = init_logger(config);
    Ok(())
}

/// Create a logger configuration from environment variables
pub fn logger_config_from_env() -> LoggerConfig {
    LoggerConfig {
        level: std::env::var("CLAWSEARCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        json_format: env_flag("CLAWSEARCH_LOG_JSON", false),
        with_timestamps: env_flag("CLAWSEARCH_LOG_TIMESTAMPS", true),
        with_file_info: env_flag("CLAWSEARCH_LOG_FILE_INFO", false),
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v.parse().unwrap_or(default))
        .unwrap_or(default)
}

/// Log level utilities
pub struct LogLevel;

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level: &str) -> Result<Level> {
        Level::from_str(level)
            .map_err(|e| ClawError::validation(format!("Invalid log level '{}': {}", level, e)))
    }

    /// Get all available log levels
    pub fn all_levels() -> Vec<&'static str> {
        vec!["trace", "debug", "info", "warn", "error"]
    }

    /// Check if a log level string is valid
    pub fn is_valid(level: &str) -> bool {
        Self::all_levels().contains(&level.to_lowercase().as_str())
    }
}
