//! Document and collection path handling.
//!
//! Paths alternate collection and document segments:
//! `users/u1` is a document, `users/u1/contacts` a collection,
//! `users/u1/contacts/c9` a document again.

use st_core::constants::collections;
use st_core::error::{StError, StResult};

/// A parsed document path: the collection it lives in plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    /// Parse a document path (even number of non-empty segments).
    pub fn parse(path: &str) -> StResult<Self> {
        let segments = split_segments(path)?;
        if segments.len() % 2 != 0 {
            return Err(StError::InvalidPath(format!("{path} is a collection, not a document")));
        }
        let (id, parent) = segments
            .split_last()
            .ok_or_else(|| StError::InvalidPath(path.to_string()))?;
        Ok(Self {
            collection: parent.join("/"),
            id: (*id).to_string(),
        })
    }

    /// The full slash-joined path.
    pub fn full(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Validate a collection path (odd number of non-empty segments).
pub fn validate_collection(path: &str) -> StResult<()> {
    let segments = split_segments(path)?;
    if segments.len() % 2 == 0 {
        return Err(StError::InvalidPath(format!("{path} is a document, not a collection")));
    }
    Ok(())
}

fn split_segments(path: &str) -> StResult<Vec<&str>> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(StError::InvalidPath(format!("empty segment in '{path}'")));
    }
    Ok(segments)
}

// ─── Path builders ───────────────────────────────────────────────────────────
//
// Ids come from callers, so each one must be a single non-empty segment.

fn segment(id: &str) -> StResult<&str> {
    if id.trim().is_empty() {
        return Err(StError::InvalidPath("empty document id".into()));
    }
    if id.contains('/') {
        return Err(StError::InvalidPath(format!("document id '{id}' contains '/'")));
    }
    Ok(id)
}

pub fn user(uid: &str) -> StResult<String> {
    Ok(format!("{}/{}", collections::USERS, segment(uid)?))
}

pub fn username(name: &str) -> StResult<String> {
    Ok(format!("{}/{}", collections::USERNAMES, segment(name)?))
}

pub fn group(group_id: &str) -> StResult<String> {
    Ok(format!("{}/{}", collections::GROUPS, segment(group_id)?))
}

pub fn contacts(uid: &str) -> StResult<String> {
    Ok(format!("{}/{}", user(uid)?, collections::CONTACTS))
}

pub fn contact(uid: &str, contact_id: &str) -> StResult<String> {
    Ok(format!("{}/{}", contacts(uid)?, segment(contact_id)?))
}

pub fn messages(chat_id: &str) -> StResult<String> {
    Ok(format!("{}/{}/{}", collections::CHATS, segment(chat_id)?, collections::MESSAGES))
}

pub fn message(chat_id: &str, message_id: &str) -> StResult<String> {
    Ok(format!("{}/{}", messages(chat_id)?, segment(message_id)?))
}

pub fn subscriptions(uid: &str) -> StResult<String> {
    Ok(format!("{}/{}", user(uid)?, collections::SUBSCRIPTIONS))
}

pub fn subscription(uid: &str, subscription_id: &str) -> StResult<String> {
    Ok(format!("{}/{}", subscriptions(uid)?, segment(subscription_id)?))
}
