//! Prompt templates and structured-output parsing.
//!
//! Templates use `{{field}}` placeholders. Model answers are expected to be
//! JSON, but models like to wrap it in Markdown fences or add a sentence
//! around it, so parsing digs the first JSON object out of the text.

use serde::de::DeserializeOwned;

use st_core::error::{StError, StResult};

/// Replace every `{{key}}` placeholder in `template` with its value.
///
/// The template is scanned once, so braces inside substituted values are
/// copied through untouched. Unknown placeholders are left as-is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            rest = &rest[open..];
            break;
        };
        let key = &after[..close];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

/// Render items as `- item` lines, or `- (none)` for an empty list.
pub fn bullet_list(items: &[String]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(|i| format!("- {i}"))
        .collect();
    if lines.is_empty() {
        "- (none)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Parse a model answer into the declared output shape.
pub fn parse_json_output<T: DeserializeOwned>(raw: &str) -> StResult<T> {
    let candidate = extract_json(raw)
        .ok_or_else(|| StError::Model(format!("no JSON object in model output: {}", snippet(raw))))?;
    serde_json::from_str(candidate)
        .map_err(|e| StError::Model(format!("model output does not match schema: {e}")))
}

/// Locate the outermost JSON object in `raw`.
pub fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = strip_fences(raw.trim());
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn snippet(raw: &str) -> String {
    let s: String = raw.chars().take(80).collect();
    if raw.chars().count() > 80 {
        format!("{s}...")
    } else {
        s
    }
}
