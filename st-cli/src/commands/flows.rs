//! Flows command - list the flows the server exposes.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::Value;

use st_core::error::StResult;
use st_flows::flows::flow_definitions;

use crate::OutputFormat;

pub fn run(format: OutputFormat) -> StResult<()> {
    let defs = flow_definitions();

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({ "flows": defs })),
        OutputFormat::Text => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Flow", "Inputs", "Description"]);

            for def in &defs {
                table.add_row(vec![
                    def["name"].as_str().unwrap_or("-").to_string(),
                    input_summary(def),
                    def["description"].as_str().unwrap_or("").to_string(),
                ]);
            }

            println!("{table}");
            println!("\n{} flow(s)", defs.len());
        }
    }

    Ok(())
}

/// "text*, targetLanguage*" with required fields starred.
fn input_summary(def: &Value) -> String {
    let required: Vec<&str> = def["inputSchema"]["required"]
        .as_array()
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    def["inputSchema"]["properties"]
        .as_object()
        .map(|props| {
            props
                .keys()
                .map(|k| {
                    if required.contains(&k.as_str()) {
                        format!("{k}*")
                    } else {
                        k.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_summary_marks_required() {
        let def = json!({
            "name": "x",
            "inputSchema": {
                "type": "object",
                "properties": { "a": {"type": "string"}, "b": {"type": "string"} },
                "required": ["a"]
            }
        });
        assert_eq!(input_summary(&def), "a*, b");
    }
}
