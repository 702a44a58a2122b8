//! Model-backed flows: translateMessage, detectLanguage, generateReadme.

mod common;

use std::time::{Duration, Instant};

use common::{FakeModel, FakePush, TestEnv};
use st_core::error::StError;
use st_flows::flows::detect_language::{detect_language, DetectInput};
use st_flows::flows::readme::{generate_readme, ReadmeInput};
use st_flows::flows::translate::{translate_message, TranslateInput};

fn translate_input(text: &str, lang: &str) -> TranslateInput {
    TranslateInput {
        text: text.to_string(),
        target_language: lang.to_string(),
    }
}

// ---- translateMessage ----

#[tokio::test]
async fn translate_returns_translated_text() {
    let env = TestEnv::new(
        FakeModel::answering(r#"{"translatedText": "Bonjour tout le monde"}"#),
        FakePush::new(),
    );

    let out = translate_message(&env.ctx, translate_input("Hello everyone", "fr"))
        .await
        .unwrap();

    assert_eq!(out.translated_text, "Bonjour tout le monde");
    assert_eq!(env.model.calls(), 1);
    assert!(env.model.last_prompt().unwrap().contains("Hello everyone"));
}

#[tokio::test]
async fn translate_keeps_placeholder_text_in_message() {
    let env = TestEnv::new(
        FakeModel::answering(r#"{"translatedText": "x"}"#),
        FakePush::new(),
    );

    translate_message(&env.ctx, translate_input("literal {{targetLanguage}} braces", "fr"))
        .await
        .unwrap();

    let prompt = env.model.last_prompt().unwrap();
    assert!(prompt.contains("literal {{targetLanguage}} braces"));
}

#[tokio::test]
async fn translate_accepts_hinglish_mixed_script() {
    let env = TestEnv::new(
        FakeModel::answering("```json\n{\"translatedText\": \"Kal milte hain, ठीक है?\"}\n```"),
        FakePush::new(),
    );

    let out = translate_message(&env.ctx, translate_input("See you tomorrow, okay?", "en-IN"))
        .await
        .unwrap();

    assert_eq!(out.translated_text, "Kal milte hain, ठीक है?");
    assert!(env.model.last_prompt().unwrap().contains("Hinglish"));
}

#[tokio::test]
async fn translate_retries_once_after_delay() {
    let env = TestEnv::new(
        FakeModel::scripted(
            vec![Err("overloaded".into())],
            Ok(r#"{"translatedText": "Hola"}"#.into()),
        ),
        FakePush::new(),
    );

    let started = Instant::now();
    let out = translate_message(&env.ctx, translate_input("Hi", "es")).await.unwrap();

    assert_eq!(out.translated_text, "Hola");
    assert_eq!(env.model.calls(), 2);
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[tokio::test]
async fn translate_retries_unparseable_output() {
    let env = TestEnv::new(
        FakeModel::scripted(
            vec![Ok("I cannot do that".into())],
            Ok(r#"{"translatedText": "Hallo"}"#.into()),
        ),
        FakePush::new(),
    );

    let out = translate_message(&env.ctx, translate_input("Hello", "de")).await.unwrap();
    assert_eq!(out.translated_text, "Hallo");
    assert_eq!(env.model.calls(), 2);
}

#[tokio::test]
async fn translate_fails_after_second_failure() {
    let env = TestEnv::new(FakeModel::failing("quota exceeded"), FakePush::new());

    let err = translate_message(&env.ctx, translate_input("Hello", "ja"))
        .await
        .unwrap_err();

    assert!(matches!(err, StError::FlowFailed { ref flow, .. } if flow == "translateMessage"));
    assert_eq!(env.model.calls(), 2);
}

#[tokio::test]
async fn translate_rejects_empty_input_without_calling_model() {
    let env = TestEnv::new(FakeModel::answering("{}"), FakePush::new());

    let err = translate_message(&env.ctx, translate_input("   ", "fr"))
        .await
        .unwrap_err();
    assert!(matches!(err, StError::InvalidInput(_)));

    let err = translate_message(&env.ctx, translate_input("hi", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, StError::InvalidInput(_)));
    assert_eq!(env.model.calls(), 0);
}

// ---- detectLanguage ----

#[tokio::test]
async fn detect_returns_two_letter_code() {
    let env = TestEnv::new(FakeModel::answering(r#"{"languageCode": "FR"}"#), FakePush::new());

    let out = detect_language(&env.ctx, DetectInput { text: "Bonjour".into() }).await;
    assert_eq!(out.language_code, "fr");
}

#[tokio::test]
async fn detect_accepts_bare_code() {
    let env = TestEnv::new(FakeModel::answering("hi\n"), FakePush::new());

    let out = detect_language(&env.ctx, DetectInput { text: "kya haal hai".into() }).await;
    assert_eq!(out.language_code, "hi");
}

#[tokio::test]
async fn detect_empty_text_skips_model() {
    let env = TestEnv::new(FakeModel::answering(r#"{"languageCode": "en"}"#), FakePush::new());

    let out = detect_language(&env.ctx, DetectInput { text: "  \n".into() }).await;
    assert!(out.is_undetermined());
    assert_eq!(env.model.calls(), 0);
}

#[tokio::test]
async fn detect_never_fails() {
    let failing = TestEnv::new(FakeModel::failing("boom"), FakePush::new());
    let out = detect_language(&failing.ctx, DetectInput { text: "hello".into() }).await;
    assert_eq!(out.language_code, "und");
    assert_eq!(failing.model.calls(), 1);

    let odd = TestEnv::new(FakeModel::answering(r#"{"languageCode": "en-GB"}"#), FakePush::new());
    let out = detect_language(&odd.ctx, DetectInput { text: "colour".into() }).await;
    assert_eq!(out.language_code, "und");
}

// ---- generateReadme ----

#[tokio::test]
async fn readme_generates_markdown() {
    let env = TestEnv::new(
        FakeModel::answering(r##"{"readme": "# Secure Talk\n\nPrivate messaging."}"##),
        FakePush::new(),
    );

    let out = generate_readme(
        &env.ctx,
        ReadmeInput {
            project_name: "Secure Talk".into(),
            description: "Private messaging".into(),
            features: vec!["Groups".into(), "Translation".into()],
            tech_stack: vec!["Rust".into()],
        },
    )
    .await
    .unwrap();

    assert!(out.readme.starts_with("# Secure Talk"));
    let prompt = env.model.last_prompt().unwrap();
    assert!(prompt.contains("- Groups"));
    assert!(prompt.contains("- Rust"));
}

#[tokio::test]
async fn readme_failure_is_an_error_without_retry() {
    let env = TestEnv::new(FakeModel::failing("unavailable"), FakePush::new());

    let err = generate_readme(
        &env.ctx,
        ReadmeInput {
            project_name: "X".into(),
            description: "Y".into(),
            features: vec![],
            tech_stack: vec![],
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StError::Model(_)));
    assert_eq!(env.model.calls(), 1);
}
