//! Contact entries that populate a user's chat list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a contact points at another user or at a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    #[default]
    User,
    Group,
}

/// A contact at `users/{uid}/contacts/{id}`.
///
/// For a user contact `id` is the other user's uid; for a group it is the
/// group id. `chat_id` addresses the message collection either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub kind: ContactKind,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub chat_id: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Per-chat wallpaper override.
    #[serde(default)]
    pub wallpaper_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl Contact {
    /// A contact entry for a group; the group id doubles as the chat id.
    pub fn for_group(group_id: &str, name: &str, avatar_url: Option<String>) -> Self {
        Self {
            id: group_id.to_string(),
            kind: ContactKind::Group,
            display_name: name.to_string(),
            avatar_url,
            chat_id: group_id.to_string(),
            last_message: None,
            last_message_at: None,
            wallpaper_url: None,
            added_at: Utc::now(),
        }
    }

    /// A contact entry pointing at another user.
    pub fn for_user(uid: &str, display_name: &str, avatar_url: Option<String>, chat_id: &str) -> Self {
        Self {
            id: uid.to_string(),
            kind: ContactKind::User,
            display_name: display_name.to_string(),
            avatar_url,
            chat_id: chat_id.to_string(),
            last_message: None,
            last_message_at: None,
            wallpaper_url: None,
            added_at: Utc::now(),
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == ContactKind::Group
    }
}

/// Chat id for a one-to-one conversation: both uids sorted, joined by `_`.
pub fn chat_id_for(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}
