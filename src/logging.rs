//! # Structured Logging Module
//!
//! Environment-aware structured logging for registry construction, resolution
//! and failure translation.
//!
//! The library itself only emits `tracing` events. Installing a subscriber is left
//! to the embedding application; these helpers exist for binaries, tests and
//! benchmarks that have none of their own.

use crate::config::LoggingSettings;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    init_with_settings(&LoggingSettings::default());
}

/// Initialize structured logging from explicit settings.
///
/// Only the first call has any effect. An already installed global subscriber
/// is left in place.
pub fn init_with_settings(settings: &LoggingSettings) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = settings
            .level
            .clone()
            .unwrap_or_else(|| get_log_level(&environment).to_string());

        let console = if settings.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(&log_level))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(&log_level))
                .boxed()
        };

        if tracing_subscriber::registry().with(console).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized, keeping existing subscriber"
            );
        }

        tracing::info!(
            environment = %environment,
            level = %log_level,
            json = settings.json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("TAXON_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for registry operations
pub fn log_registry_operation(
    operation: &str,
    extension_point: &str,
    type_name: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        extension_point = %extension_point,
        type_name = type_name,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "REGISTRY_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
