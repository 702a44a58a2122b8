//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use st_api::{DeliveryReport, GenerateRequest, PushPayload, PushTransport, TextModel};
use st_core::config::StoreConfig;
use st_core::error::{StError, StResult};
use st_flows::{EventBus, FlowContext, FlowSettings};
use serde_json::Value;
use st_models::{Database, Document, DocumentStore, PushTarget, SqliteDocumentStore, WebPushKeys, WriteBatch};
use tempfile::TempDir;

/// Text model that replays scripted answers and counts calls.
///
/// Once the script runs out every call returns `fallback`.
pub struct FakeModel {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn answering(answer: &str) -> Self {
        Self::scripted(Vec::new(), Ok(answer.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::scripted(Vec::new(), Err(message.to_string()))
    }

    pub fn scripted(script: Vec<Result<String, String>>, fallback: Result<String, String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextModel for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, request: &GenerateRequest) -> StResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map_err(StError::Model)
    }
}

/// Push transport answering a fixed status per target label.
///
/// Targets without an entry get 201. A `None` status makes the delivery
/// itself fail.
pub struct FakePush {
    statuses: HashMap<String, Option<u16>>,
    delivered: Mutex<Vec<String>>,
}

impl FakePush {
    pub fn new() -> Self {
        Self {
            statuses: HashMap::new(),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(mut self, target: &PushTarget, status: u16) -> Self {
        self.statuses.insert(target.label(), Some(status));
        self
    }

    pub fn with_transport_error(mut self, target: &PushTarget) -> Self {
        self.statuses.insert(target.label(), None);
        self
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for FakePush {
    async fn deliver(&self, target: &PushTarget, _payload: &PushPayload) -> StResult<DeliveryReport> {
        let label = target.label();
        self.delivered.lock().unwrap().push(label.clone());
        match self.statuses.get(&label) {
            Some(None) => Err(StError::Http(format!("connection refused: {label}"))),
            Some(Some(status)) if (200..300).contains(status) => Ok(DeliveryReport::ok(*status)),
            Some(Some(status)) => Ok(DeliveryReport::failed(*status, "rejected")),
            None => Ok(DeliveryReport::ok(201)),
        }
    }
}

/// A flow context over a temporary SQLite store.
pub struct TestEnv {
    pub ctx: FlowContext,
    pub model: Arc<FakeModel>,
    pub push: Arc<FakePush>,
    pub store: SqliteDocumentStore,
    _dir: TempDir,
}

impl TestEnv {
    pub fn new(model: FakeModel, push: FakePush) -> Self {
        Self::build(model, push, false)
    }

    /// Same, but every store write is refused.
    pub fn read_only(model: FakeModel, push: FakePush) -> Self {
        Self::build(model, push, true)
    }

    fn build(model: FakeModel, push: FakePush, read_only: bool) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let db = Database::init(&dir.path().join("test.db"), &StoreConfig::default())
            .expect("failed to init test database");
        let store = SqliteDocumentStore::new(db).read_only(read_only);
        let model = Arc::new(model);
        let push = Arc::new(push);

        let settings = FlowSettings {
            translation_retry_delay: Duration::from_millis(20),
            email_domain: "securetalk.app".to_string(),
        };
        let ctx = FlowContext::new(
            Arc::new(store.clone()),
            model.clone(),
            push.clone(),
            EventBus::new(64),
            settings,
        );

        Self {
            ctx,
            model,
            push,
            store,
            _dir: dir,
        }
    }

    /// A context over the same database whose username claim reads always
    /// come back empty, as if another registration had not landed yet.
    pub fn stale_claims_ctx(&self) -> FlowContext {
        FlowContext::new(
            Arc::new(StaleClaims(self.store.clone())),
            self.model.clone(),
            self.push.clone(),
            EventBus::new(64),
            FlowSettings {
                translation_retry_delay: Duration::from_millis(20),
                email_domain: "securetalk.app".to_string(),
            },
        )
    }

    /// A writable store over the same database, for seeding a read-only env.
    pub fn writable_store(&self) -> SqliteDocumentStore {
        SqliteDocumentStore::new(self.store.database().clone())
    }
}

/// Store that hides `usernames/*` documents from `get`.
struct StaleClaims(SqliteDocumentStore);

#[async_trait]
impl DocumentStore for StaleClaims {
    async fn get(&self, path: &str) -> StResult<Option<Document>> {
        if path.starts_with("usernames/") {
            return Ok(None);
        }
        self.0.get(path).await
    }

    async fn set(&self, path: &str, data: Value) -> StResult<()> {
        self.0.set(path, data).await
    }

    async fn merge(&self, path: &str, data: Value) -> StResult<()> {
        self.0.merge(path, data).await
    }

    async fn delete(&self, path: &str) -> StResult<bool> {
        self.0.delete(path).await
    }

    async fn list(&self, collection: &str) -> StResult<Vec<Document>> {
        self.0.list(collection).await
    }

    async fn commit(&self, batch: WriteBatch) -> StResult<()> {
        self.0.commit(batch).await
    }
}

pub fn web_target(n: u32) -> PushTarget {
    PushTarget::Web {
        endpoint: format!("https://push{n}.example.com/sub/{n}"),
        keys: WebPushKeys {
            p256dh: format!("p256dh-{n}"),
            auth: format!("auth-{n}"),
        },
    }
}

pub fn mobile_target(token: &str) -> PushTarget {
    PushTarget::Mobile {
        token: token.to_string(),
    }
}
