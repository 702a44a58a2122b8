//! Push subscription documents.
//!
//! A user can hold any number of targets: browser Push API subscriptions
//! and hosted mobile-push tokens share one collection.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Browser subscription keys as handed out by `PushManager.subscribe()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Where a push goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PushTarget {
    /// Browser Push API subscription.
    Web { endpoint: String, keys: WebPushKeys },
    /// Hosted mobile-push registration token.
    Mobile { token: String },
}

impl PushTarget {
    /// Stable document id: hex MD5 of the endpoint or token.
    ///
    /// Re-subscribing the same browser or device overwrites its document.
    pub fn subscription_id(&self) -> String {
        let key = match self {
            Self::Web { endpoint, .. } => endpoint.as_str(),
            Self::Mobile { token } => token.as_str(),
        };
        let mut hasher = Md5::new();
        hasher.update(key.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Short label for logs (never the full token).
    pub fn label(&self) -> String {
        match self {
            Self::Web { endpoint, .. } => {
                let host = endpoint
                    .split("://")
                    .nth(1)
                    .and_then(|rest| rest.split('/').next())
                    .unwrap_or("unknown");
                format!("web:{host}")
            }
            Self::Mobile { token } => {
                let head: String = token.chars().take(8).collect();
                format!("mobile:{head}")
            }
        }
    }
}

/// A subscription at `users/{uid}/subscriptions/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub target: PushTarget,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl PushSubscription {
    pub fn new(target: PushTarget, user_agent: Option<String>) -> Self {
        Self {
            id: target.subscription_id(),
            target,
            user_agent,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web() -> PushTarget {
        PushTarget::Web {
            endpoint: "https://fcm.googleapis.com/fcm/send/abc".into(),
            keys: WebPushKeys {
                p256dh: "pk".into(),
                auth: "au".into(),
            },
        }
    }

    #[test]
    fn test_subscription_id_is_stable_hex() {
        let id = web().subscription_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, web().subscription_id());
        assert_ne!(id, PushTarget::Mobile { token: "t".into() }.subscription_id());
    }

    #[test]
    fn test_flattened_web_shape() {
        let sub = PushSubscription::new(web(), None);
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["endpoint"], "https://fcm.googleapis.com/fcm/send/abc");
        assert_eq!(json["keys"]["p256dh"], "pk");

        let back: PushSubscription = serde_json::from_value(json).unwrap();
        assert_eq!(back.target, web());
    }

    #[test]
    fn test_mobile_shape_parses() {
        let sub: PushSubscription = serde_json::from_value(serde_json::json!({
            "token": "device-token-123"
        }))
        .unwrap();
        assert!(matches!(sub.target, PushTarget::Mobile { .. }));
        assert_eq!(sub.target.label(), "mobile:device-t");
    }

    #[test]
    fn test_web_label() {
        assert_eq!(web().label(), "web:fcm.googleapis.com");
    }
}
