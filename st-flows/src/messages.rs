//! Chat messages.
//!
//! Messages live under `chats/{chatId}/messages`. After a send, the chat
//! preview on each participant's contact entry is refreshed best effort.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use st_core::error::{StError, StResult};
use st_models::store::{get_as, set_as};
use st_models::models::contact::chat_id_for;
use st_models::{path, Group, Message};

use crate::context::FlowContext;
use crate::event_bus::AppEvent;

/// Characters of the message kept in the contact preview.
const PREVIEW_CHARS: usize = 80;

/// Write a text message and refresh chat previews.
pub async fn send_message(ctx: &FlowContext, chat_id: &str, sender_id: &str, text: &str) -> StResult<Message> {
    if chat_id.trim().is_empty() || sender_id.trim().is_empty() {
        return Err(StError::InvalidInput("chatId and senderId must not be empty".into()));
    }
    if text.trim().is_empty() {
        return Err(StError::InvalidInput("message text must not be empty".into()));
    }

    let message = Message::text(chat_id, sender_id, text);
    ctx.observe(
        "send_message",
        set_as(ctx.store.as_ref(), &path::message(chat_id, &message.id)?, &message).await,
    )?;

    refresh_previews(ctx, &message).await;
    ctx.events.emit(AppEvent::MessageSent {
        chat_id: chat_id.to_string(),
        message_id: message.id.clone(),
        sender_id: sender_id.to_string(),
    });
    Ok(message)
}

/// The last `limit` messages of a chat, oldest first.
pub async fn list_messages(ctx: &FlowContext, chat_id: &str, limit: usize) -> StResult<Vec<Message>> {
    let docs = ctx.observe("list_messages", ctx.store.list(&path::messages(chat_id)?).await)?;
    let mut messages: Vec<Message> = docs
        .iter()
        .filter_map(|doc| match doc.decode::<Message>() {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("skipping malformed message: {e}");
                None
            }
        })
        .collect();
    messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then_with(|| a.id.cmp(&b.id)));

    let skip = messages.len().saturating_sub(limit);
    Ok(messages.into_iter().skip(skip).collect())
}

/// Store a translation next to the original text.
pub async fn record_translation(
    ctx: &FlowContext,
    chat_id: &str,
    message_id: &str,
    translated_text: &str,
    language: Option<&str>,
) -> StResult<()> {
    let message_path = path::message(chat_id, message_id)?;
    let existing: Option<Message> =
        ctx.observe("record_translation", get_as(ctx.store.as_ref(), &message_path).await)?;
    if existing.is_none() {
        return Err(StError::NotFound(message_path));
    }

    let mut patch = json!({ "translatedText": translated_text });
    if let Some(language) = language {
        patch["language"] = json!(language);
    }
    ctx.observe("record_translation", ctx.store.merge(&message_path, patch).await)
}

/// Who sees this chat and under which contact id.
///
/// Group chats use the group id for every member. A one-to-one chat id is
/// the two uids sorted and joined by `_`; uids may contain `_` themselves,
/// so the other side is whatever remains once the sender is stripped off.
async fn participants(ctx: &FlowContext, message: &Message) -> Vec<(String, String)> {
    if let Ok(group_path) = path::group(&message.chat_id) {
        if let Ok(Some(group)) = get_as::<Group>(ctx.store.as_ref(), &group_path).await {
            return group
                .members
                .into_iter()
                .map(|m| (m, group.id.clone()))
                .collect();
        }
    }

    let sender = message.sender_id.as_str();
    let other = message
        .chat_id
        .strip_prefix(&format!("{sender}_"))
        .or_else(|| message.chat_id.strip_suffix(&format!("_{sender}")));
    match other {
        Some(other) if !other.is_empty() && chat_id_for(sender, other) == message.chat_id => {
            vec![
                (sender.to_string(), other.to_string()),
                (other.to_string(), sender.to_string()),
            ]
        }
        _ => Vec::new(),
    }
}

async fn refresh_previews(ctx: &FlowContext, message: &Message) {
    let preview = message.preview(PREVIEW_CHARS);
    let sent_at: DateTime<Utc> = message.sent_at;

    for (owner, contact_id) in participants(ctx, message).await {
        let Ok(contact_path) = path::contact(&owner, &contact_id) else {
            continue;
        };
        // Only touch existing entries; merge would create a bare one.
        match ctx.store.get(&contact_path).await {
            Ok(Some(_)) => {}
            Ok(None) => continue,
            Err(e) => {
                debug!("skipping preview for {contact_path}: {e}");
                continue;
            }
        }
        let patch = json!({ "lastMessage": preview, "lastMessageAt": sent_at });
        if let Err(e) = ctx.store.merge(&contact_path, patch).await {
            warn!("failed to refresh preview {contact_path}: {e}");
            ctx.report_error("send_message", &e);
        }
    }
}
