//! Typed event bus for flow side effects.
//!
//! Uses a tokio broadcast channel so flows can report what they changed
//! without knowing who is listening. The server logs events; tests
//! subscribe to assert on them.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Application-level events emitted by flows and data operations.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The document store refused an operation.
    PermissionDenied {
        operation: String,
        path: String,
        /// Flow or data operation that hit the denial.
        source: String,
    },
    /// A push subscription reported 410 and was removed.
    SubscriptionExpired {
        user_id: String,
        subscription_id: String,
    },
    /// A group and its member contacts were written.
    GroupCreated {
        group_id: String,
        owner_id: String,
        member_count: usize,
    },
    /// A user was added to another user's contacts.
    ContactAdded {
        owner_id: String,
        contact_id: String,
        chat_id: String,
    },
    /// A message document was written.
    MessageSent {
        chat_id: String,
        message_id: String,
        sender_id: String,
    },
    /// A username claim and profile were written.
    UserRegistered {
        uid: String,
        username: String,
    },
    /// A flow finished with an error.
    FlowFailed {
        flow: String,
        error: String,
    },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Slow subscribers that fall behind
/// receive a `Lagged` error and miss events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to receive application events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => {
                debug!("event_bus: emitted {label} to {count} subscriber(s)");
            }
            Err(_) => {
                debug!("event_bus: no subscribers for {label}");
            }
        }
    }

    /// Get the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Human-readable label for an event (for logging).
pub fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::PermissionDenied { .. } => "PermissionDenied",
        AppEvent::SubscriptionExpired { .. } => "SubscriptionExpired",
        AppEvent::GroupCreated { .. } => "GroupCreated",
        AppEvent::ContactAdded { .. } => "ContactAdded",
        AppEvent::MessageSent { .. } => "MessageSent",
        AppEvent::UserRegistered { .. } => "UserRegistered",
        AppEvent::FlowFailed { .. } => "FlowFailed",
    }
}
