//! Readme command.

use std::path::PathBuf;

use clap::Args;
use console::style;

use st_core::config::ConfigHandle;
use st_core::error::StResult;
use st_flows::flows::readme::{generate_readme, ReadmeInput};

use crate::OutputFormat;

#[derive(Args)]
pub struct ReadmeArgs {
    /// Project name.
    #[arg(short, long)]
    pub name: String,
    /// One-paragraph project description.
    #[arg(short, long)]
    pub description: String,
    /// A feature bullet (repeatable).
    #[arg(long = "feature")]
    pub features: Vec<String>,
    /// A technology used (repeatable).
    #[arg(long = "tech")]
    pub tech_stack: Vec<String>,
    /// Write the README to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(config: ConfigHandle, args: ReadmeArgs, format: OutputFormat) -> StResult<()> {
    let ctx = super::build_context(&config).await?;

    let pb = super::spinner(format, &format!("Writing README for {}", args.name));
    let result = generate_readme(
        &ctx,
        ReadmeInput {
            project_name: args.name,
            description: args.description,
            features: args.features,
            tech_stack: args.tech_stack,
        },
    )
    .await;
    pb.finish_and_clear();
    let output = result?;

    if let Some(path) = &args.output {
        std::fs::write(path, &output.readme)?;
    }

    match format {
        OutputFormat::Json => super::print_json(&output),
        OutputFormat::Text => match &args.output {
            Some(path) => println!(
                "{} README written to {}",
                style("OK").green().bold(),
                path.display()
            ),
            None => println!("{}", output.readme),
        },
    }
    Ok(())
}
