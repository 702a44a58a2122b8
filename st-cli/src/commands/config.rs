//! Config commands.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use dialoguer::{Confirm, Input, Password};

use st_core::config::{AppConfig, ConfigHandle};
use st_core::error::{StError, StResult};
use st_server::auth::generate_token;

use crate::OutputFormat;

const MASK: &str = "********";

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (secrets masked).
    Show,
    /// Write a configuration file, prompting for credentials.
    Init {
        /// Accept defaults without prompting.
        #[arg(short, long)]
        yes: bool,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path.
    Path,
}

pub async fn run(
    config: ConfigHandle,
    config_path: Option<PathBuf>,
    action: ConfigAction,
    format: OutputFormat,
) -> StResult<()> {
    let path = match config_path {
        Some(p) => p,
        None => AppConfig::default_config_path()?,
    };

    match action {
        ConfigAction::Show => {
            let cfg = masked(&config.snapshot().await);
            match format {
                OutputFormat::Json => super::print_json(&cfg),
                OutputFormat::Text => {
                    let text = toml::to_string_pretty(&cfg)
                        .map_err(|e| StError::Config(format!("failed to serialize config: {e}")))?;
                    println!("{} {}\n", style("#").dim(), style(path.display()).dim());
                    println!("{text}");
                }
            }
        }

        ConfigAction::Init { yes, force } => {
            if path.exists() && !force {
                let overwrite = !yes
                    && Confirm::new()
                        .with_prompt(format!("  {} exists. Overwrite?", path.display()))
                        .default(false)
                        .interact()
                        .unwrap_or(false);
                if !overwrite {
                    println!("Kept existing config at {}.", path.display());
                    return Ok(());
                }
            }

            let mut cfg = config.snapshot().await;
            if cfg.server.auth_token.is_empty() {
                cfg.server.auth_token = generate_token();
            }

            if !yes {
                cfg.model.api_key = prompt_secret("Model API key (blank to skip)", &cfg.model.api_key)?;
                cfg.model.model = Input::new()
                    .with_prompt("Model")
                    .default(cfg.model.model.clone())
                    .interact_text()
                    .map_err(|e| StError::Internal(e.to_string()))?;
                cfg.push.fcm_project_id = Input::new()
                    .with_prompt("FCM project id (blank to skip)")
                    .default(cfg.push.fcm_project_id.clone())
                    .allow_empty(true)
                    .interact_text()
                    .map_err(|e| StError::Internal(e.to_string()))?;
                if !cfg.push.fcm_project_id.is_empty() {
                    cfg.push.fcm_access_token =
                        prompt_secret("FCM access token", &cfg.push.fcm_access_token)?;
                }
            }

            cfg.save_to_file(&path)?;
            *config.write().await = cfg;

            match format {
                OutputFormat::Json => {
                    super::print_json(&serde_json::json!({ "path": path.display().to_string() }))
                }
                OutputFormat::Text => {
                    println!("{} Wrote {}", style("OK").green().bold(), path.display());
                    println!("  Flow server token is in [server].auth_token.");
                }
            }
        }

        ConfigAction::Path => match format {
            OutputFormat::Json => {
                super::print_json(&serde_json::json!({ "path": path.display().to_string() }))
            }
            OutputFormat::Text => println!("{}", path.display()),
        },
    }

    Ok(())
}

/// Password prompt that keeps the current value when left blank.
fn prompt_secret(prompt: &str, current: &str) -> StResult<String> {
    let value = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| StError::Internal(e.to_string()))?;
    Ok(if value.is_empty() { current.to_string() } else { value })
}

/// Copy of the config with every credential replaced by a mask.
fn masked(cfg: &AppConfig) -> AppConfig {
    let mut out = cfg.clone();
    for secret in [
        &mut out.server.auth_token,
        &mut out.model.api_key,
        &mut out.push.fcm_access_token,
        &mut out.push.vapid_authorization,
    ] {
        if !secret.is_empty() {
            *secret = MASK.to_string();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_only_set_secrets() {
        let mut cfg = AppConfig::default();
        cfg.model.api_key = "AIza-secret".into();
        cfg.server.auth_token = "tok".into();

        let out = masked(&cfg);
        assert_eq!(out.model.api_key, MASK);
        assert_eq!(out.server.auth_token, MASK);
        assert!(out.push.fcm_access_token.is_empty());
        assert_eq!(out.model.model, cfg.model.model);
    }
}
