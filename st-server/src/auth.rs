//! Bearer token management and validation for the flow server.

use std::sync::Arc;

use base64::Engine;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::debug;

/// Holds the token callers must present on flow routes.
#[derive(Clone)]
pub struct FlowAuth {
    token: Arc<RwLock<String>>,
}

impl FlowAuth {
    /// Create a FlowAuth with a freshly generated random token.
    pub fn new() -> Self {
        debug!("flow auth initialized with new token");
        Self {
            token: Arc::new(RwLock::new(generate_token())),
        }
    }

    /// Restore a configured token.
    pub fn with_token(token: String) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Use the configured token, or generate one if it is empty.
    ///
    /// The flag reports whether a new token was generated.
    pub fn from_config(token: &str) -> (Self, bool) {
        if token.trim().is_empty() {
            (Self::new(), true)
        } else {
            (Self::with_token(token.trim().to_string()), false)
        }
    }

    /// Validate an `Authorization` header value of the form `Bearer <token>`.
    pub async fn validate(&self, header: &str) -> bool {
        let expected = self.token.read().await;
        match header.strip_prefix("Bearer ") {
            Some(provided) => constant_time_eq(provided.trim().as_bytes(), expected.as_bytes()),
            None => false,
        }
    }

    pub async fn current_token(&self) -> String {
        self.token.read().await.clone()
    }

    /// Replace the token with a new random one and return it.
    pub async fn regenerate(&self) -> String {
        let new_token = generate_token();
        *self.token.write().await = new_token.clone();
        debug!("flow token regenerated");
        new_token
    }
}

impl Default for FlowAuth {
    fn default() -> Self {
        Self::new()
    }
}

/// 32 random bytes as base64url without padding (43 characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length() {
        assert_eq!(generate_token().len(), 43);
        assert_ne!(generate_token(), generate_token());
    }

    #[tokio::test]
    async fn test_validate() {
        let auth = FlowAuth::with_token("secret-token".into());
        assert!(auth.validate("Bearer secret-token").await);
        assert!(!auth.validate("Bearer secret-tokeN").await);
        assert!(!auth.validate("Bearer short").await);
        assert!(!auth.validate("secret-token").await);
        assert!(!auth.validate("").await);
    }

    #[tokio::test]
    async fn test_from_config() {
        let (auth, generated) = FlowAuth::from_config("  ");
        assert!(generated);
        assert_eq!(auth.current_token().await.len(), 43);

        let (auth, generated) = FlowAuth::from_config("kept");
        assert!(!generated);
        assert_eq!(auth.current_token().await, "kept");
    }

    #[tokio::test]
    async fn test_regenerate() {
        let auth = FlowAuth::new();
        let old = auth.current_token().await;
        let new = auth.regenerate().await;
        assert_ne!(old, new);
        assert!(auth.validate(&format!("Bearer {new}")).await);
        assert!(!auth.validate(&format!("Bearer {old}")).await);
    }
}
