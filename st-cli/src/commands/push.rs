//! Push command - fan a notification out to a user's subscriptions.

use clap::Args;
use console::style;

use st_core::config::ConfigHandle;
use st_core::error::StResult;
use st_flows::flows::push::{send_push_notification, PushInput};

use crate::OutputFormat;

#[derive(Args)]
pub struct PushArgs {
    /// Recipient user id.
    pub user_id: String,
    /// Notification title.
    #[arg(short, long)]
    pub title: String,
    /// Notification body.
    #[arg(short, long, default_value = "")]
    pub body: String,
    /// URL to open when the notification is clicked.
    #[arg(long)]
    pub url: Option<String>,
    /// Icon URL.
    #[arg(long)]
    pub icon: Option<String>,
}

pub async fn run(config: ConfigHandle, args: PushArgs, format: OutputFormat) -> StResult<()> {
    let ctx = super::build_context(&config).await?;

    let output = send_push_notification(
        &ctx,
        PushInput {
            user_id: args.user_id.clone(),
            title: args.title,
            body: args.body,
            url: args.url,
            icon: args.icon,
        },
    )
    .await?;

    match format {
        OutputFormat::Json => super::print_json(&output),
        OutputFormat::Text => {
            if let Some(err) = &output.error {
                println!("{} {err}", style("FAIL").red().bold());
                return Ok(());
            }
            if output.results.is_empty() {
                println!("No push subscriptions for {}.", args.user_id);
                return Ok(());
            }
            for r in &output.results {
                let status = r
                    .status_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let tag = if r.success {
                    style("OK").green().bold()
                } else if r.expired {
                    style("GONE").yellow().bold()
                } else {
                    style("FAIL").red().bold()
                };
                let detail = r.error.as_deref().unwrap_or("");
                println!("  {tag} {} ({status}) {detail}", super::truncate(&r.subscription_id, 12));
            }
            println!(
                "\n{} of {} delivered",
                output.delivered(),
                output.results.len()
            );
        }
    }
    Ok(())
}
