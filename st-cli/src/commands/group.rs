//! Group commands.

use clap::Subcommand;
use console::style;

use st_core::config::ConfigHandle;
use st_core::error::StResult;
use st_flows::flows::group::{create_group, CreateGroupInput};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum GroupAction {
    /// Create a group and add it to every member's contacts.
    Create {
        /// Group name.
        #[arg(short, long)]
        name: String,
        /// Owner user id (becomes the admin).
        #[arg(short, long)]
        owner: String,
        /// Member user id (repeatable).
        #[arg(short, long = "member")]
        members: Vec<String>,
        /// Optional description.
        #[arg(short, long)]
        description: Option<String>,
        /// Optional avatar URL.
        #[arg(long)]
        avatar_url: Option<String>,
    },
}

pub async fn run(config: ConfigHandle, action: GroupAction, format: OutputFormat) -> StResult<()> {
    let ctx = super::build_context(&config).await?;

    match action {
        GroupAction::Create { name, owner, members, description, avatar_url } => {
            let input = CreateGroupInput {
                name: name.clone(),
                owner_id: owner,
                member_ids: members,
                description,
                avatar_url,
            };
            let member_count = input.members().len();
            let output = create_group(&ctx, input).await?;

            match format {
                OutputFormat::Json => super::print_json(&output),
                OutputFormat::Text => {
                    println!(
                        "{} Created group {} ({member_count} member(s))",
                        style("OK").green().bold(),
                        style(&name).bold()
                    );
                    println!("  id: {}", style(&output.group_id).cyan());
                }
            }
        }
    }
    Ok(())
}
