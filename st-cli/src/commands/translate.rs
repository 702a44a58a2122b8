//! Translate command.

use console::style;

use st_core::config::ConfigHandle;
use st_core::error::StResult;
use st_flows::flows::translate::{translate_message, TranslateInput};

use crate::OutputFormat;

pub async fn run(config: ConfigHandle, text: String, to: String, format: OutputFormat) -> StResult<()> {
    let ctx = super::build_context(&config).await?;

    let pb = super::spinner(format, &format!("Translating to {to}"));
    let result = translate_message(
        &ctx,
        TranslateInput {
            text,
            target_language: to.clone(),
        },
    )
    .await;
    pb.finish_and_clear();
    let output = result?;

    match format {
        OutputFormat::Json => super::print_json(&output),
        OutputFormat::Text => {
            println!("{} {}", style(format!("[{to}]")).cyan().bold(), output.translated_text);
        }
    }
    Ok(())
}
