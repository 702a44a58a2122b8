//! Name-based dispatch with JSON in and out.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use common::{FakeModel, FakePush, TestEnv};
use st_core::error::{StError, StResult};
use st_flows::{AppEvent, FlowContext, FlowRegistry};
use st_models::{Document, DocumentStore, WriteBatch};

/// Store whose every operation is refused.
struct DenyingStore;

fn denied<T>(operation: &str, path: &str) -> StResult<T> {
    Err(StError::PermissionDenied {
        operation: operation.to_string(),
        path: path.to_string(),
    })
}

#[async_trait]
impl DocumentStore for DenyingStore {
    async fn get(&self, path: &str) -> StResult<Option<Document>> {
        denied("get", path)
    }
    async fn set(&self, path: &str, _data: Value) -> StResult<()> {
        denied("set", path)
    }
    async fn merge(&self, path: &str, _data: Value) -> StResult<()> {
        denied("merge", path)
    }
    async fn delete(&self, path: &str) -> StResult<bool> {
        denied("delete", path)
    }
    async fn list(&self, collection: &str) -> StResult<Vec<Document>> {
        denied("list", collection)
    }
    async fn commit(&self, batch: WriteBatch) -> StResult<()> {
        let path = batch.ops().first().map(|op| op.path().to_string()).unwrap_or_default();
        denied("commit", &path)
    }
}

fn denying_context(env: &TestEnv) -> FlowContext {
    let store: Arc<dyn DocumentStore> = Arc::new(DenyingStore);
    let mut ctx = env.ctx.clone();
    ctx.store = store;
    ctx
}

#[tokio::test]
async fn lists_every_flow() {
    let env = TestEnv::new(FakeModel::answering(""), FakePush::new());
    let registry = FlowRegistry::new(env.ctx.clone());

    let defs = registry.definitions();
    assert_eq!(defs.len(), 5);
    assert!(registry.contains("createGroup"));
    assert!(!registry.contains("deleteEverything"));
}

#[tokio::test]
async fn executes_by_name_with_json() {
    let env = TestEnv::new(
        FakeModel::answering(r#"{"translatedText": "Ciao"}"#),
        FakePush::new(),
    );
    let registry = FlowRegistry::new(env.ctx.clone());

    let out = registry
        .execute("translateMessage", json!({"text": "Hi", "targetLanguage": "it"}))
        .await
        .unwrap();
    assert_eq!(out, json!({"translatedText": "Ciao"}));

    let group = registry
        .execute("createGroup", json!({"name": "Team", "ownerId": "u1", "memberIds": ["u2"]}))
        .await
        .unwrap();
    assert!(group["groupId"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn unknown_flow_is_reported() {
    let env = TestEnv::new(FakeModel::answering(""), FakePush::new());
    let registry = FlowRegistry::new(env.ctx.clone());

    let err = registry.execute("summarize", json!({})).await.unwrap_err();
    assert!(matches!(err, StError::UnknownFlow(_)));
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn malformed_input_is_invalid() {
    let env = TestEnv::new(FakeModel::answering(""), FakePush::new());
    let registry = FlowRegistry::new(env.ctx.clone());
    let mut rx = registry.event_bus().subscribe();

    let err = registry
        .execute("generateReadme", json!({"projectName": 42}))
        .await
        .unwrap_err();
    assert!(matches!(err, StError::InvalidInput(_)));
    assert_eq!(err.http_status(), 400);

    assert!(matches!(
        rx.recv().await.unwrap(),
        AppEvent::FlowFailed { ref flow, .. } if flow == "generateReadme"
    ));
}

#[tokio::test]
async fn detect_language_with_missing_text_is_und() {
    let env = TestEnv::new(FakeModel::answering("en"), FakePush::new());
    let registry = FlowRegistry::new(env.ctx.clone());

    let out = registry.execute("detectLanguage", json!({})).await.unwrap();
    assert_eq!(out, json!({"languageCode": "und"}));
}

#[tokio::test]
async fn permission_denied_is_rebroadcast() {
    let env = TestEnv::new(FakeModel::answering(""), FakePush::new());
    let registry = FlowRegistry::new(denying_context(&env));
    let mut rx = registry.event_bus().subscribe();

    let err = registry
        .execute("createGroup", json!({"name": "Team", "ownerId": "u1"}))
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    match rx.recv().await.unwrap() {
        AppEvent::PermissionDenied { operation, path, source } => {
            assert_eq!(operation, "commit");
            assert!(path.starts_with("groups/"));
            assert_eq!(source, "createGroup");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn push_read_failure_is_a_failed_result_not_an_error() {
    let env = TestEnv::new(FakeModel::answering(""), FakePush::new());
    let registry = FlowRegistry::new(denying_context(&env));
    let mut rx = registry.event_bus().subscribe();

    let out = registry
        .execute("sendPushNotification", json!({"userId": "u1", "title": "Hi"}))
        .await
        .unwrap();

    assert_eq!(out["success"], false);
    assert_eq!(out["results"], json!([]));
    assert!(out["error"].as_str().unwrap().contains("permission denied"));
    assert!(matches!(
        rx.recv().await.unwrap(),
        AppEvent::PermissionDenied { ref operation, .. } if operation == "list"
    ));
}
