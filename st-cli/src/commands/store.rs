//! Document store management commands.

use std::path::Path;

use clap::Subcommand;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;
use tracing::info;

use st_core::config::ConfigHandle;
use st_core::error::{StError, StResult};
use st_models::db::DatabaseStats;
use st_models::Database;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum StoreAction {
    /// Show document counts per collection.
    Stats,
    /// Run an integrity check.
    Check,
    /// Delete every document (WARNING: destroys all data).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(config: ConfigHandle, action: StoreAction, format: OutputFormat) -> StResult<()> {
    let cfg = config.snapshot().await;
    let db_path = cfg.effective_store_path()?;

    match action {
        StoreAction::Stats => {
            let db = Database::init(&db_path, &cfg.store)?;
            let stats = db.stats()?;
            info!("store stats: {stats}");
            match format {
                OutputFormat::Json => super::print_json(&stats_json(&db_path, &stats)),
                OutputFormat::Text => print_stats(&db_path, &stats),
            }
        }
        StoreAction::Check => {
            let db = Database::init(&db_path, &cfg.store)?;
            match db.run_integrity_check() {
                Ok(()) => println!("  {} Integrity check passed.", style("OK").green().bold()),
                Err(e) => {
                    println!("  {} {e}", style("FAIL").red().bold());
                    return Err(e);
                }
            }
        }
        StoreAction::Reset { yes } => {
            if cfg.store.read_only {
                return Err(StError::PermissionDenied {
                    operation: "reset".into(),
                    path: db_path.display().to_string(),
                });
            }

            if !yes {
                println!("  {} This deletes ALL documents.", style("WARNING").red().bold());
                println!("  Store: {}", db_path.display());
                let confirmed = Confirm::new()
                    .with_prompt("  Reset the document store?")
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmed {
                    println!("  Reset cancelled.");
                    return Ok(());
                }
            }

            let db = Database::init(&db_path, &cfg.store)?;
            db.reset()?;
            println!("  {} Document store reset.", style("OK").green().bold());
        }
    }

    Ok(())
}

fn stats_json(db_path: &Path, stats: &DatabaseStats) -> serde_json::Value {
    let collections: serde_json::Map<String, serde_json::Value> = stats
        .collections
        .iter()
        .map(|(name, count)| (name.clone(), (*count).into()))
        .collect();
    serde_json::json!({
        "path": db_path.display().to_string(),
        "collections": collections,
        "total": stats.total(),
    })
}

fn print_stats(db_path: &Path, stats: &DatabaseStats) {
    println!("{}", style("Document Store").bold().underlined());
    println!("  Path:  {}", db_path.display());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Collection", "Documents"]);
    for (name, count) in &stats.collections {
        table.add_row(vec![name.clone(), count.to_string()]);
    }
    table.add_row(vec![style("total").bold().to_string(), stats.total().to_string()]);
    println!("{table}");
}
