//! Secure Talk CLI - Run the flow server and call flows from the terminal.
//!
//! Every flow the server exposes can also be invoked once from here, which
//! is handy for scripting and for checking model and push credentials
//! before the server goes live.

mod commands;

use clap::{Parser, Subcommand};
use tracing::info;

use st_core::config::{AppConfig, ConfigHandle};
use st_core::error::StResult;
use st_core::logging;

/// Secure Talk - AI-assisted chat flows.
#[derive(Parser)]
#[command(
    name = "securetalk",
    version,
    about = "Secure Talk flow server and CLI",
    long_about = "Runs the Secure Talk flow server (translation, language detection,\n\
                  README generation, push fan-out, group creation) and invokes\n\
                  each flow directly from the terminal."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the flow server until Ctrl-C.
    Serve {
        /// Bind address (overrides config).
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides config).
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List the flows the server exposes.
    Flows,
    /// Translate a message.
    Translate {
        /// Text to translate.
        text: String,
        /// Target language code (e.g. "fr", "hi", "en-IN" for Hinglish).
        #[arg(short, long)]
        to: String,
    },
    /// Detect the language of a text.
    Detect {
        /// Text to inspect.
        text: String,
    },
    /// Generate a README for a project.
    Readme {
        #[command(flatten)]
        args: commands::readme::ReadmeArgs,
    },
    /// Send a push notification to every subscription of a user.
    Push {
        #[command(flatten)]
        args: commands::push::PushArgs,
    },
    /// Group management.
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// User profiles, contacts and push subscriptions.
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Document store statistics, integrity check and reset.
    Store {
        #[command(subcommand)]
        action: commands::store::StoreAction,
    },
    /// View and create the configuration file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> StResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(std::path::PathBuf::from);
    let config = match &config_path {
        Some(path) if path.exists() => AppConfig::load_from_file(path)?,
        Some(_) => AppConfig::default(),
        None => AppConfig::load_default()?,
    };

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let log_dir = config
        .effective_log_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("logs"));
    let _guard = logging::init_logging(&log_level, &log_dir, config.logging.json_output)?;

    let config_handle = ConfigHandle::new(config);

    info!("Secure Talk CLI v{}", st_core::constants::APP_VERSION);

    // Dispatch to command handlers
    match cli.command {
        Commands::Serve { bind, port } => {
            commands::serve::run(config_handle, config_path, bind, port).await
        }
        Commands::Flows => commands::flows::run(cli.format),
        Commands::Translate { text, to } => {
            commands::translate::run(config_handle, text, to, cli.format).await
        }
        Commands::Detect { text } => {
            commands::detect::run(config_handle, text, cli.format).await
        }
        Commands::Readme { args } => {
            commands::readme::run(config_handle, args, cli.format).await
        }
        Commands::Push { args } => {
            commands::push::run(config_handle, args, cli.format).await
        }
        Commands::Group { action } => {
            commands::group::run(config_handle, action, cli.format).await
        }
        Commands::User { action } => {
            commands::user::run(config_handle, action, cli.format).await
        }
        Commands::Store { action } => {
            commands::store::run(config_handle, action, cli.format).await
        }
        Commands::Config { action } => {
            commands::config::run(config_handle, config_path, action, cli.format).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_group_create() {
        let cli = Cli::try_parse_from([
            "securetalk", "-f", "json", "group", "create", "--name", "Team", "--owner", "u1",
            "--member", "u2", "--member", "u3",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Group {
                action: commands::group::GroupAction::Create { name, members, .. },
            } => {
                assert_eq!(name, "Team");
                assert_eq!(members, vec!["u2", "u3"]);
            }
            _ => panic!("expected group create"),
        }
    }

    #[test]
    fn test_parses_store_reset() {
        let cli = Cli::try_parse_from(["securetalk", "store", "reset", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store {
                action: commands::store::StoreAction::Reset { yes: true }
            }
        ));
    }

    #[test]
    fn test_subscribe_needs_complete_web_keys() {
        let result = Cli::try_parse_from([
            "securetalk", "user", "subscribe", "u1", "--endpoint", "https://push.example/x",
        ]);
        assert!(result.is_err());
    }
}
