//! Push delivery seam.
//!
//! Mobile tokens go through the FCM HTTP v1 API. Browser subscriptions
//! receive a payload-less push with a pre-minted VAPID `Authorization`
//! header; the service worker fetches the notification content itself.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use st_core::config::PushConfig;
use st_core::constants::PUSH_EXPIRED_STATUS;
use st_core::error::{StError, StResult};
use st_models::PushTarget;

use crate::client::HttpClient;
use crate::response::GoogleErrorEnvelope;

/// Notification content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// What the push service answered for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub status: u16,
    pub message: Option<String>,
}

impl DeliveryReport {
    pub fn ok(status: u16) -> Self {
        Self { status, message: None }
    }

    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The target is gone for good and its subscription should be removed.
    pub fn is_expired(&self) -> bool {
        self.status == PUSH_EXPIRED_STATUS
    }
}

/// Delivers one notification to one target.
///
/// `Ok` carries whatever status the push service returned, including
/// rejections. `Err` means no status was obtained at all.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn deliver(&self, target: &PushTarget, payload: &PushPayload) -> StResult<DeliveryReport>;
}

/// HTTP push transport for FCM tokens and browser endpoints.
#[derive(Clone)]
pub struct HttpPushTransport {
    http: HttpClient,
    config: PushConfig,
}

impl HttpPushTransport {
    pub fn new(config: &PushConfig) -> StResult<Self> {
        Ok(Self {
            http: HttpClient::new(config.timeout_ms)?,
            config: config.clone(),
        })
    }

    fn fcm_endpoint(&self) -> String {
        format!(
            "{}/projects/{}/messages:send",
            self.config.fcm_api_base.trim_end_matches('/'),
            self.config.fcm_project_id
        )
    }

    fn fcm_body(token: &str, payload: &PushPayload) -> serde_json::Value {
        let mut notification = json!({
            "title": payload.title,
            "body": payload.body,
        });
        if let Some(icon) = &payload.icon {
            notification["image"] = json!(icon);
        }

        let mut message = json!({
            "token": token,
            "notification": notification,
        });
        if let Some(url) = &payload.url {
            message["data"] = json!({ "url": url });
            message["webpush"] = json!({ "fcm_options": { "link": url } });
        }

        json!({ "message": message })
    }

    async fn deliver_mobile(&self, token: &str, payload: &PushPayload) -> StResult<DeliveryReport> {
        if self.config.fcm_project_id.is_empty() || self.config.fcm_access_token.is_empty() {
            return Err(StError::MissingConfig(
                "push.fcm_project_id / push.fcm_access_token".into(),
            ));
        }

        let builder = self
            .http
            .request(Method::POST, &self.fcm_endpoint())
            .bearer_auth(&self.config.fcm_access_token)
            .json(&Self::fcm_body(token, payload));
        let response = self.http.send(builder).await?;
        let status = response.status().as_u16();

        if response.status().is_success() {
            return Ok(DeliveryReport::ok(status));
        }

        let body = response.text().await.unwrap_or_default();
        let message = GoogleErrorEnvelope::message_from(&body);
        // FCM reports unregistered tokens as 404; normalize to the expiry status.
        let status = if status == 404 && body.contains("UNREGISTERED") {
            PUSH_EXPIRED_STATUS
        } else {
            status
        };
        Ok(DeliveryReport::failed(status, message))
    }

    async fn deliver_web(&self, endpoint: &str) -> StResult<DeliveryReport> {
        let mut builder = self
            .http
            .request(Method::POST, endpoint)
            .header("TTL", self.config.ttl_secs.to_string())
            .header("Urgency", "normal")
            .header("Content-Length", "0");
        if !self.config.vapid_authorization.is_empty() {
            builder = builder.header("Authorization", self.config.vapid_authorization.as_str());
        }

        let response = self.http.send(builder).await?;
        let status = response.status().as_u16();
        if response.status().is_success() {
            Ok(DeliveryReport::ok(status))
        } else {
            let body = response.text().await.unwrap_or_default();
            Ok(DeliveryReport::failed(status, body.chars().take(200).collect::<String>()))
        }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn deliver(&self, target: &PushTarget, payload: &PushPayload) -> StResult<DeliveryReport> {
        debug!(target = %target.label(), "delivering push");
        let report = match target {
            PushTarget::Mobile { token } => self.deliver_mobile(token, payload).await?,
            PushTarget::Web { endpoint, .. } => self.deliver_web(endpoint).await?,
        };
        if !report.is_success() {
            warn!(target = %target.label(), status = report.status, "push rejected");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_classification() {
        assert!(DeliveryReport::ok(201).is_success());
        assert!(!DeliveryReport::failed(500, "x").is_success());
        assert!(DeliveryReport::failed(410, "gone").is_expired());
        assert!(!DeliveryReport::failed(404, "nf").is_expired());
    }

    #[test]
    fn test_fcm_body_shape() {
        let payload = PushPayload {
            title: "Hi".into(),
            body: "There".into(),
            url: Some("/chat/abc".into()),
            icon: None,
        };
        let body = HttpPushTransport::fcm_body("tok", &payload);
        assert_eq!(body["message"]["token"], "tok");
        assert_eq!(body["message"]["notification"]["title"], "Hi");
        assert_eq!(body["message"]["data"]["url"], "/chat/abc");
        assert!(body["message"]["notification"].get("image").is_none());
    }

    #[tokio::test]
    async fn test_mobile_requires_fcm_config() {
        let transport = HttpPushTransport::new(&st_core::AppConfig::default().push).unwrap();
        let err = transport
            .deliver(
                &PushTarget::Mobile { token: "t".into() },
                &PushPayload::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StError::MissingConfig(_)));
    }

    #[test]
    fn test_fcm_endpoint() {
        let mut cfg = st_core::AppConfig::default().push;
        cfg.fcm_project_id = "proj".into();
        let transport = HttpPushTransport::new(&cfg).unwrap();
        assert_eq!(
            transport.fcm_endpoint(),
            "https://fcm.googleapis.com/v1/projects/proj/messages:send"
        );
    }
}
