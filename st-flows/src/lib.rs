//! Secure Talk Flows - The AI-assisted text flows and the data operations
//! they rely on.
//!
//! Each flow validates a typed input, either prompts the hosted text model
//! or touches the document store, and returns a typed output. The
//! `FlowRegistry` exposes them by name with JSON in and out.

pub mod context;
pub mod event_bus;
pub mod prompt;
pub mod registry;
pub mod flows;
pub mod accounts;
pub mod contacts;
pub mod messages;
pub mod subscriptions;

// Re-export key types
pub use context::{FlowContext, FlowSettings, UnconfiguredModel};
pub use event_bus::{AppEvent, EventBus};
pub use registry::FlowRegistry;
