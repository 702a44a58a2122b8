//! Flow registry: look a flow up by name and run it with JSON in and out.
//!
//! Failures are logged, announced on the event bus, and store permission
//! denials are rebroadcast as `AppEvent::PermissionDenied`.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use st_core::constants::flows;
use st_core::error::{StError, StResult};

use crate::context::FlowContext;
use crate::event_bus::{AppEvent, EventBus};
use crate::flows::{detect_language, flow_definitions, group, push, readme, translate};

/// Name-based dispatch over every flow.
#[derive(Clone)]
pub struct FlowRegistry {
    ctx: FlowContext,
}

impl FlowRegistry {
    pub fn new(ctx: FlowContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.ctx.events
    }

    /// Name, description and input schema of every flow.
    pub fn definitions(&self) -> Vec<Value> {
        flow_definitions()
    }

    pub fn contains(&self, name: &str) -> bool {
        flows::ALL.contains(&name)
    }

    /// Run a flow by name.
    pub async fn execute(&self, name: &str, args: Value) -> StResult<Value> {
        debug!("executing flow: {name}");
        let started = Instant::now();

        let result = match name {
            flows::TRANSLATE_MESSAGE => translate::execute(&self.ctx, args).await,
            flows::DETECT_LANGUAGE => detect_language::execute(&self.ctx, args).await,
            flows::GENERATE_README => readme::execute(&self.ctx, args).await,
            flows::SEND_PUSH_NOTIFICATION => push::execute(&self.ctx, args).await,
            flows::CREATE_GROUP => group::execute(&self.ctx, args).await,
            _ => return Err(StError::UnknownFlow(name.to_string())),
        };

        let elapsed = started.elapsed().as_millis();
        match &result {
            Ok(_) => info!("flow {name} completed in {elapsed}ms"),
            Err(e) => {
                warn!("flow {name} failed after {elapsed}ms: {e}");
                self.ctx.report_error(name, e);
                self.ctx.events.emit(AppEvent::FlowFailed {
                    flow: name.to_string(),
                    error: e.to_string(),
                });
            }
        }
        result
    }
}
