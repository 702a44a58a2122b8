//! Detect command.

use console::style;

use st_core::config::ConfigHandle;
use st_core::error::StResult;
use st_flows::flows::detect_language::{detect_language, DetectInput};

use crate::OutputFormat;

pub async fn run(config: ConfigHandle, text: String, format: OutputFormat) -> StResult<()> {
    let ctx = super::build_context(&config).await?;

    let pb = super::spinner(format, "Detecting language");
    let output = detect_language(&ctx, DetectInput { text }).await;
    pb.finish_and_clear();

    match format {
        OutputFormat::Json => super::print_json(&output),
        OutputFormat::Text => {
            if output.is_undetermined() {
                println!("{} Language could not be determined.", style("und").yellow().bold());
            } else {
                println!("{}", style(&output.language_code).green().bold());
            }
        }
    }
    Ok(())
}
