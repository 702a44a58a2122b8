//! `detectLanguage`: guess the ISO 639-1 code of a message.
//!
//! Never fails: anything short of a clean two-letter answer is `und`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use st_api::GenerateRequest;
use st_core::constants::{flows, UNDETERMINED_LANGUAGE};
use st_core::error::StResult;

use super::parse_input;
use crate::context::FlowContext;
use crate::prompt::{fill_template, parse_json_output};

const PROMPT: &str = "Identify the language of the following text. Answer with its two-letter \
ISO 639-1 code in lowercase. If the text is romanized Hindi or Hinglish, answer \"hi\". If you \
cannot tell, answer \"und\".

Text:
{{text}}

Respond with JSON only: {\"languageCode\": \"<code>\"}";

#[derive(Debug, Clone, Deserialize)]
pub struct DetectInput {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectOutput {
    pub language_code: String,
}

impl DetectOutput {
    pub fn undetermined() -> Self {
        Self {
            language_code: UNDETERMINED_LANGUAGE.to_string(),
        }
    }

    pub fn is_undetermined(&self) -> bool {
        self.language_code == UNDETERMINED_LANGUAGE
    }
}

pub fn definition() -> Value {
    json!({
        "name": flows::DETECT_LANGUAGE,
        "description": "Detect the language of a text. Returns a two-letter ISO 639-1 code, or 'und' when unsure.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to classify"
                }
            },
            "required": ["text"]
        }
    })
}

/// Two lowercase ASCII letters, or `und`.
pub fn normalize_code(raw: &str) -> String {
    let code = raw.trim().trim_matches('"').to_ascii_lowercase();
    if code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase()) {
        code
    } else {
        UNDETERMINED_LANGUAGE.to_string()
    }
}

pub async fn detect_language(ctx: &FlowContext, input: DetectInput) -> DetectOutput {
    if input.text.trim().is_empty() {
        return DetectOutput::undetermined();
    }

    let prompt = fill_template(PROMPT, &[("text", &input.text)]);
    let raw = match ctx.model.generate(&GenerateRequest::json(prompt)).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("language detection failed: {e}");
            return DetectOutput::undetermined();
        }
    };

    // Accept a bare code as well as the JSON shape.
    let answer = match parse_json_output::<DetectOutput>(&raw) {
        Ok(out) => out.language_code,
        Err(_) => raw,
    };
    let output = DetectOutput {
        language_code: normalize_code(&answer),
    };
    debug!("detected language: {}", output.language_code);
    output
}

pub async fn execute(ctx: &FlowContext, args: Value) -> StResult<Value> {
    let input: DetectInput = parse_input(flows::DETECT_LANGUAGE, args)?;
    let output = detect_language(ctx, input).await;
    Ok(serde_json::to_value(output)?)
}
