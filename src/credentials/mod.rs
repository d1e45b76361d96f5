//! Shared store for the seller API access token.
//!
//! The credential is replaced wholesale on each successful refresh. Readers
//! may observe a stale token; they never wait on a refresh in flight.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// An access token together with the time it was obtained
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub obtained_at: DateTime<Utc>,
}

pub struct CredentialStore {
    inner: Arc<RwLock<Option<Credential>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Replaces the stored credential with a freshly obtained token.
    pub async fn replace(&self, access_token: String) {
        let credential = Credential {
            access_token,
            obtained_at: Utc::now(),
        };
        *self.inner.write().await = Some(credential);
    }

    /// Returns the current credential, stale or not. `None` until the first
    /// successful refresh.
    pub async fn current(&self) -> Option<Credential> {
        self.inner.read().await.clone()
    }
}

impl Clone for CredentialStore {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_empty() {
        let store = CredentialStore::new();
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_credential() {
        let store = CredentialStore::new();
        store.replace("tok-1".to_string()).await;
        let first = store.current().await.unwrap();
        assert_eq!(first.access_token, "tok-1");

        store.replace("tok-2".to_string()).await;
        let second = store.current().await.unwrap();
        assert_eq!(second.access_token, "tok-2");
        assert!(second.obtained_at >= first.obtained_at);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = CredentialStore::new();
        let other = store.clone();
        store.replace("shared".to_string()).await;
        assert_eq!(other.current().await.unwrap().access_token, "shared");
    }
}
