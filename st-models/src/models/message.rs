//! Chat message documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    System,
}

/// A message at `chats/{chatId}/messages/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub translated_text: Option<String>,
    /// Detected language code of `text`.
    #[serde(default)]
    pub language: Option<String>,
}

impl Message {
    /// A new text message with a random id.
    pub fn text(chat_id: &str, sender_id: &str, text: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            kind: MessageKind::Text,
            image_url: None,
            sent_at: Utc::now(),
            translated_text: None,
            language: None,
        }
    }

    /// Short preview for chat lists and notifications.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.kind {
            MessageKind::Image if self.text.is_empty() => "Photo".to_string(),
            _ => {
                let mut preview: String = self.text.chars().take(max_chars).collect();
                if self.text.chars().count() > max_chars {
                    preview.push_str("...");
                }
                preview
            }
        }
    }
}
