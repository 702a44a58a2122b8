//! User profile and username claim documents.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use st_core::error::{StError, StResult};

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-z0-9_]{3,20}$").unwrap();
}

/// A user profile at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    /// Preferred language for incoming message translation.
    #[serde(default)]
    pub language: Option<String>,
    /// Default chat wallpaper; per-chat overrides live on the contact.
    #[serde(default)]
    pub wallpaper_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Build a fresh profile. The display name falls back to the username.
    pub fn new(uid: &str, username: &str, display_name: Option<&str>, email_domain: &str) -> Self {
        let display_name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(username)
            .to_string();
        Self {
            uid: uid.to_string(),
            username: username.to_string(),
            display_name,
            email: username_to_email(username, email_domain),
            avatar_url: None,
            about: None,
            language: None,
            wallpaper_url: None,
            created_at: Utc::now(),
        }
    }
}

/// Reservation of a username at `usernames/{username}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsernameClaim {
    pub uid: String,
}

/// Normalize and validate a username: lowercase, 3 to 20 of `[a-z0-9_]`.
pub fn normalize_username(raw: &str) -> StResult<String> {
    let username = raw.trim().to_lowercase();
    if !USERNAME_RE.is_match(&username) {
        return Err(StError::InvalidInput(format!(
            "username '{raw}' must be 3-20 characters of a-z, 0-9 or _"
        )));
    }
    Ok(username)
}

/// The sign-in email synthesized for a username.
///
/// The auth service only knows email/password accounts, so every username
/// maps to `username@domain`.
pub fn username_to_email(username: &str, domain: &str) -> String {
    format!("{}@{}", username.trim().to_lowercase(), domain)
}

/// Recover the username from a synthesized email, if it uses `domain`.
pub fn email_to_username(email: &str, domain: &str) -> Option<String> {
    email
        .strip_suffix(domain)
        .and_then(|rest| rest.strip_suffix('@'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  Alice_01 ").unwrap(), "alice_01");
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("has space").is_err());
        assert!(normalize_username("dash-name").is_err());
        assert!(normalize_username(&"x".repeat(21)).is_err());
    }

    #[test]
    fn test_email_roundtrip() {
        let email = username_to_email("Bob", "securetalk.app");
        assert_eq!(email, "bob@securetalk.app");
        assert_eq!(email_to_username(&email, "securetalk.app").as_deref(), Some("bob"));
        assert_eq!(email_to_username("bob@other.com", "securetalk.app"), None);
        assert_eq!(email_to_username("@securetalk.app", "securetalk.app"), None);
    }

    #[test]
    fn test_profile_defaults_on_sparse_document() {
        let json = serde_json::json!({"uid": "u1", "username": "alice"});
        let profile: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.display_name, "");
        assert!(profile.avatar_url.is_none());
    }

    #[test]
    fn test_profile_new_display_name_fallback() {
        let p = UserProfile::new("u1", "alice", Some("  "), "securetalk.app");
        assert_eq!(p.display_name, "alice");
        assert_eq!(p.email, "alice@securetalk.app");
        let p = UserProfile::new("u1", "alice", Some("Alice A."), "securetalk.app");
        assert_eq!(p.display_name, "Alice A.");
    }
}
