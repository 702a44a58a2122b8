//! Secure Talk Server - HTTP/1.1 JSON front for the flow registry.
//!
//! Routes:
//! - `GET /health`          -- liveness, no auth
//! - `GET /flows`           -- flow catalog with input schemas
//! - `POST /flows/{name}`   -- run one flow
//!
//! Flow routes require `Authorization: Bearer <token>`.

pub mod auth;
pub mod server;

pub use auth::FlowAuth;
pub use server::{spawn_event_logger, FlowServer};
