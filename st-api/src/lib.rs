//! Secure Talk API - HTTP clients for the hosted services the flows call.
//!
//! This crate provides the `TextModel` and `PushTransport` seams plus their
//! HTTP adapters: the Generative Language REST API for text generation, and
//! the FCM HTTP v1 API / browser push endpoints for notification delivery.

pub mod client;
pub mod model;
pub mod push;
pub mod response;

// Re-export key types
pub use client::HttpClient;
pub use model::{GeminiClient, GenerateRequest, TextModel};
pub use push::{DeliveryReport, HttpPushTransport, PushPayload, PushTransport};
pub use response::GenerateContentResponse;
