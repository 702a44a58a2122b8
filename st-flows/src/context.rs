//! Shared dependencies handed to every flow invocation.
//!
//! Holds the document store, text model, push transport and event bus,
//! plus the handful of settings flows read. Built once at startup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use st_api::{GeminiClient, GenerateRequest, HttpPushTransport, PushTransport, TextModel};
use st_core::config::AppConfig;
use st_core::constants;
use st_core::error::{StError, StResult};
use st_models::{Database, DocumentStore, SqliteDocumentStore};

use crate::event_bus::{AppEvent, EventBus};

/// Settings flows read at run time.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Fixed delay before the single translation retry.
    pub translation_retry_delay: Duration,
    /// Domain for synthesized account emails.
    pub email_domain: String,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            translation_retry_delay: Duration::from_millis(constants::DEFAULT_TRANSLATION_RETRY_DELAY_MS),
            email_domain: constants::DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

impl FlowSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            translation_retry_delay: Duration::from_millis(config.flows.translation_retry_delay_ms),
            email_domain: config.accounts.email_domain.clone(),
        }
    }
}

/// Everything a flow may touch.
#[derive(Clone)]
pub struct FlowContext {
    pub store: Arc<dyn DocumentStore>,
    pub model: Arc<dyn TextModel>,
    pub push: Arc<dyn PushTransport>,
    pub events: EventBus,
    pub settings: FlowSettings,
}

impl FlowContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        model: Arc<dyn TextModel>,
        push: Arc<dyn PushTransport>,
        events: EventBus,
        settings: FlowSettings,
    ) -> Self {
        Self {
            store,
            model,
            push,
            events,
            settings,
        }
    }

    /// Open the local store and build the HTTP adapters from config.
    ///
    /// A missing model API key does not fail startup: model-backed flows
    /// report `MissingConfig` when invoked instead.
    pub fn from_config(config: &AppConfig) -> StResult<Self> {
        let store_path = config.effective_store_path()?;
        let database = Database::init(&store_path, &config.store)?;
        let store = SqliteDocumentStore::new(database).read_only(config.store.read_only);

        let model: Arc<dyn TextModel> = if config.is_model_configured() {
            Arc::new(GeminiClient::new(&config.model)?)
        } else {
            warn!("model.api_key not set; model-backed flows are unavailable");
            Arc::new(UnconfiguredModel)
        };

        let push = HttpPushTransport::new(&config.push)?;
        info!(
            "flow context ready (store: {}, model: {})",
            store_path.display(),
            model.name()
        );

        Ok(Self::new(
            Arc::new(store),
            model,
            Arc::new(push),
            EventBus::default(),
            FlowSettings::from_config(config),
        ))
    }

    /// Rebroadcast store permission denials on the event bus.
    pub fn report_error(&self, source: &str, err: &StError) {
        if let StError::PermissionDenied { operation, path } = err {
            self.events.emit(AppEvent::PermissionDenied {
                operation: operation.clone(),
                path: path.clone(),
                source: source.to_string(),
            });
        }
    }

    /// Pass a store result through, reporting permission denials.
    pub fn observe<T>(&self, source: &str, result: StResult<T>) -> StResult<T> {
        if let Err(e) = &result {
            self.report_error(source, e);
        }
        result
    }
}

/// Stand-in model used when no API key is configured.
pub struct UnconfiguredModel;

#[async_trait]
impl TextModel for UnconfiguredModel {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn generate(&self, _request: &GenerateRequest) -> StResult<String> {
        Err(StError::MissingConfig("model.api_key".into()))
    }
}
