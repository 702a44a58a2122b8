//! Document shapes for every persisted entity.
//!
//! These are shape hints only: optional fields default, unknown fields are
//! ignored, and nothing here enforces cross-document consistency.

pub mod user;
pub mod contact;
pub mod group;
pub mod message;
pub mod subscription;
