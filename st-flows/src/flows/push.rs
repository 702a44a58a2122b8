//! `sendPushNotification`: deliver one notification to every device a user
//! has subscribed.
//!
//! One attempt per device, no atomicity across devices. Subscriptions the
//! push service reports as gone (410) are deleted.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use st_api::PushPayload;
use st_core::constants::flows;
use st_core::error::StResult;
use st_models::{path, Document, PushSubscription};

use super::{parse_input, require};
use crate::context::FlowContext;
use crate::event_bus::AppEvent;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushInput {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl PushInput {
    pub fn validate(&self) -> StResult<()> {
        require("userId", &self.user_id)?;
        require("title", &self.title)
    }

    fn payload(&self) -> PushPayload {
        PushPayload {
            title: self.title.clone(),
            body: self.body.clone(),
            url: self.url.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Outcome for one subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub subscription_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The push service reported 410; the subscription is removed best effort.
    #[serde(default)]
    pub expired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushOutput {
    pub success: bool,
    pub results: Vec<DeliveryResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushOutput {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            error: Some(error),
        }
    }

    /// Number of devices that accepted the notification.
    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

pub fn definition() -> Value {
    json!({
        "name": flows::SEND_PUSH_NOTIFICATION,
        "description": "Send a notification to every push subscription of a user. Expired subscriptions are removed.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "userId": { "type": "string", "description": "Recipient uid" },
                "title": { "type": "string", "description": "Notification title" },
                "body": { "type": "string", "description": "Notification body" },
                "url": { "type": "string", "description": "Link opened on click" },
                "icon": { "type": "string", "description": "Icon or image URL" }
            },
            "required": ["userId", "title"]
        }
    })
}

pub async fn send_push_notification(ctx: &FlowContext, input: PushInput) -> StResult<PushOutput> {
    input.validate()?;

    let collection = path::subscriptions(&input.user_id)?;
    let docs = match ctx.store.list(&collection).await {
        Ok(docs) => docs,
        Err(e) => {
            warn!("failed to read subscriptions for {}: {e}", input.user_id);
            ctx.report_error(flows::SEND_PUSH_NOTIFICATION, &e);
            return Ok(PushOutput::failed(e.to_string()));
        }
    };

    if docs.is_empty() {
        debug!("no push subscriptions for {}", input.user_id);
        return Ok(PushOutput {
            success: true,
            results: Vec::new(),
            error: None,
        });
    }

    let payload = input.payload();
    let mut results = Vec::with_capacity(docs.len());
    for doc in &docs {
        results.push(deliver_one(ctx, &input.user_id, doc, &payload).await);
    }

    let output = PushOutput {
        success: true,
        results,
        error: None,
    };
    info!(
        "push to {}: {}/{} delivered",
        input.user_id,
        output.delivered(),
        output.results.len()
    );
    Ok(output)
}

async fn deliver_one(ctx: &FlowContext, user_id: &str, doc: &Document, payload: &PushPayload) -> DeliveryResult {
    let subscription: PushSubscription = match doc.decode() {
        Ok(s) => s,
        Err(e) => {
            warn!("skipping malformed subscription {}: {e}", doc.path);
            return DeliveryResult {
                subscription_id: doc.id.clone(),
                success: false,
                status_code: None,
                error: Some(e.to_string()),
                expired: false,
            };
        }
    };

    let report = match ctx.push.deliver(&subscription.target, payload).await {
        Ok(report) => report,
        Err(e) => {
            warn!("push to {} failed: {e}", subscription.target.label());
            return DeliveryResult {
                subscription_id: doc.id.clone(),
                success: false,
                status_code: None,
                error: Some(e.to_string()),
                expired: false,
            };
        }
    };

    let expired = report.is_expired();
    if expired {
        remove_expired(ctx, user_id, doc).await;
    }

    DeliveryResult {
        subscription_id: doc.id.clone(),
        success: report.is_success(),
        status_code: Some(report.status),
        error: report.message,
        expired,
    }
}

/// Best effort: a failed delete is logged, never surfaced.
async fn remove_expired(ctx: &FlowContext, user_id: &str, doc: &Document) {
    match ctx.store.delete(&doc.path).await {
        Ok(_) => {
            info!("removed expired push subscription {}", doc.path);
            ctx.events.emit(AppEvent::SubscriptionExpired {
                user_id: user_id.to_string(),
                subscription_id: doc.id.clone(),
            });
        }
        Err(e) => {
            warn!("failed to remove expired subscription {}: {e}", doc.path);
            ctx.report_error(flows::SEND_PUSH_NOTIFICATION, &e);
        }
    }
}

pub async fn execute(ctx: &FlowContext, args: Value) -> StResult<Value> {
    let input: PushInput = parse_input(flows::SEND_PUSH_NOTIFICATION, args)?;
    let output = send_push_notification(ctx, input).await?;
    Ok(serde_json::to_value(output)?)
}
