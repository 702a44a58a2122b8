//! `translateMessage`: translate a chat message into the reader's language.
//!
//! The only flow with a retry: one more attempt after a fixed delay.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use st_api::GenerateRequest;
use st_core::constants::{flows, HINGLISH_LANGUAGE};
use st_core::error::{StError, StResult};

use super::{parse_input, require};
use crate::context::FlowContext;
use crate::prompt::{fill_template, parse_json_output};

const PROMPT: &str = "Translate the following chat message into the language with code \
'{{targetLanguage}}'. Keep the meaning, tone, emoji and names. Do not add explanations.

Message:
{{text}}

Respond with JSON only: {\"translatedText\": \"<translation>\"}";

const HINGLISH_PROMPT: &str = "Rewrite the following chat message in informal Hinglish, the \
casual mix of Hindi and English used in Indian chats. Latin script or mixed script are both \
fine. Keep the meaning, tone, emoji and names. Do not add explanations.

Message:
{{text}}

Respond with JSON only: {\"translatedText\": \"<hinglish text>\"}";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateInput {
    pub text: String,
    pub target_language: String,
}

impl TranslateInput {
    pub fn validate(&self) -> StResult<()> {
        require("text", &self.text)?;
        require("targetLanguage", &self.target_language)
    }

    fn prompt(&self) -> String {
        let target = self.target_language.trim();
        let template = if target.eq_ignore_ascii_case(HINGLISH_LANGUAGE) {
            HINGLISH_PROMPT
        } else {
            PROMPT
        };
        fill_template(template, &[("text", &self.text), ("targetLanguage", target)])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateOutput {
    pub translated_text: String,
}

pub fn definition() -> Value {
    json!({
        "name": flows::TRANSLATE_MESSAGE,
        "description": "Translate a message into a target language. 'en-IN' produces informal Hinglish.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Message text to translate"
                },
                "targetLanguage": {
                    "type": "string",
                    "description": "Target language code (e.g. 'fr', 'hi', 'en-IN')"
                }
            },
            "required": ["text", "targetLanguage"]
        }
    })
}

/// Translate once, and once more after the configured delay if that fails.
pub async fn translate_message(ctx: &FlowContext, input: TranslateInput) -> StResult<TranslateOutput> {
    input.validate()?;
    let prompt = input.prompt();

    match attempt(ctx, &prompt).await {
        Ok(output) => Ok(output),
        Err(first) => {
            warn!(
                "translation to {} failed, retrying in {:?}: {first}",
                input.target_language, ctx.settings.translation_retry_delay
            );
            tokio::time::sleep(ctx.settings.translation_retry_delay).await;
            attempt(ctx, &prompt).await.map_err(|e| StError::FlowFailed {
                flow: flows::TRANSLATE_MESSAGE.to_string(),
                message: format!("failed after retry: {e}"),
            })
        }
    }
}

async fn attempt(ctx: &FlowContext, prompt: &str) -> StResult<TranslateOutput> {
    let raw = ctx.model.generate(&GenerateRequest::json(prompt)).await?;
    let output: TranslateOutput = parse_json_output(&raw)?;
    if output.translated_text.trim().is_empty() {
        return Err(StError::Model("empty translation".into()));
    }
    debug!("translated {} chars", output.translated_text.chars().count());
    Ok(output)
}

pub async fn execute(ctx: &FlowContext, args: Value) -> StResult<Value> {
    let input: TranslateInput = parse_input(flows::TRANSLATE_MESSAGE, args)?;
    let output = translate_message(ctx, input).await?;
    Ok(serde_json::to_value(output)?)
}
