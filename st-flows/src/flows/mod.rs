//! Flow implementations.
//!
//! Every flow module exposes a typed input/output pair, a `definition()`
//! describing its JSON input schema, the typed entry point, and an
//! `execute` adapter taking and returning JSON for the registry.

pub mod translate;
pub mod detect_language;
pub mod readme;
pub mod push;
pub mod group;

use serde::de::DeserializeOwned;
use serde_json::Value;

use st_core::error::{StError, StResult};

/// Return the full list of flow definitions for `GET /flows`.
pub fn flow_definitions() -> Vec<Value> {
    vec![
        translate::definition(),
        detect_language::definition(),
        readme::definition(),
        push::definition(),
        group::definition(),
    ]
}

/// Deserialize flow arguments, mapping shape errors to `InvalidInput`.
pub(crate) fn parse_input<T: DeserializeOwned>(flow: &str, args: Value) -> StResult<T> {
    serde_json::from_value(args).map_err(|e| StError::InvalidInput(format!("{flow}: {e}")))
}

/// Reject empty or whitespace-only required fields.
pub(crate) fn require(field: &str, value: &str) -> StResult<()> {
    if value.trim().is_empty() {
        return Err(StError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}
