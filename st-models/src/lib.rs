//! Secure Talk Models - Document shapes, document paths, and the store seam.
//!
//! This crate owns the client-side shape hints for every persisted entity,
//! the `DocumentStore` trait the flows talk to, and a SQLite-backed adapter
//! used for local runs and tests.

pub mod db;
pub mod schema;
pub mod path;
pub mod store;
pub mod sqlite_store;
pub mod models;

// Re-export key types
pub use db::{Database, DbPool};
pub use path::DocPath;
pub use store::{Document, DocumentStore, WriteBatch, WriteOp};
pub use sqlite_store::SqliteDocumentStore;
pub use models::user::{UserProfile, UsernameClaim};
pub use models::contact::{Contact, ContactKind};
pub use models::group::Group;
pub use models::message::{Message, MessageKind};
pub use models::subscription::{PushSubscription, PushTarget, WebPushKeys};
