//! CLI command implementations.

pub mod serve;
pub mod flows;
pub mod translate;
pub mod detect;
pub mod readme;
pub mod push;
pub mod group;
pub mod user;
pub mod store;
pub mod config;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use st_core::config::ConfigHandle;
use st_core::error::StResult;
use st_flows::FlowContext;

use crate::OutputFormat;

/// Helper to build the flow context (store, model, push) from config.
pub async fn build_context(config: &ConfigHandle) -> StResult<FlowContext> {
    let cfg = config.snapshot().await;
    FlowContext::from_config(&cfg)
}

/// Spinner shown while waiting on the model. Hidden for JSON output.
pub fn spinner(format: OutputFormat, message: &str) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print a serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Truncate a string to a maximum number of characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars > 3 {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_chars).collect()
    }
}
