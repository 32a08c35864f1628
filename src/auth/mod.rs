//! Identity capability. Sign-in itself belongs to the external identity
//! provider; the core only asks who is signed in and how to sign out.

use async_trait::async_trait;
use log::{ error, info };
use std::sync::RwLock;
use thiserror::Error as ThisError;

use crate::store::ConversationStore;

#[derive(Debug, ThisError)]
pub enum AuthError {
    #[error("sign out failed: {0}")]
    SignOut(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user_id(&self) -> Option<String>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Provider for a user id handed in from configuration.
#[derive(Debug, Default)]
pub struct LocalAuth {
    user: RwLock<Option<String>>,
}

impl LocalAuth {
    pub fn new(user: Option<String>) -> Self {
        Self {
            user: RwLock::new(user.filter(|u| !u.trim().is_empty())),
        }
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn current_user_id(&self) -> Option<String> {
        self.user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.user.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

/// Signs out and wipes local history. History is wiped even when the
/// provider reports a failure.
pub async fn logout(auth: &dyn AuthProvider, store: &ConversationStore) -> Result<(), AuthError> {
    let user = auth.current_user_id().await;
    let result = auth.sign_out().await;
    store.clear_all().await;
    match &result {
        Ok(()) => info!("Signed out {}", user.as_deref().unwrap_or("anonymous user")),
        Err(e) => error!("{}", e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ KeyValueStore, MemoryKeyValueStore, CONVERSATIONS_KEY };
    use crate::store::tests::{ store_with, StubChatClient };
    use std::sync::Arc;

    struct BrokenAuth;

    #[async_trait]
    impl AuthProvider for BrokenAuth {
        async fn current_user_id(&self) -> Option<String> {
            Some("u-1".to_string())
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            Err(AuthError::SignOut("provider unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_blank_user_is_anonymous() {
        assert_eq!(LocalAuth::new(Some("  ".to_string())).current_user_id().await, None);
        assert_eq!(LocalAuth::new(None).current_user_id().await, None);
    }

    #[tokio::test]
    async fn test_logout_signs_out_and_clears_history() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = store_with(kv.clone(), StubChatClient::replying("")).await;
        store.create_conversation().await;
        let auth = LocalAuth::new(Some("alice@example.com".to_string()));
        assert_eq!(auth.current_user_id().await.as_deref(), Some("alice@example.com"));

        logout(&auth, &store).await.unwrap();
        assert_eq!(auth.current_user_id().await, None);
        assert!(store.conversations().await.is_empty());
        assert_eq!(kv.get(CONVERSATIONS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_sign_out_still_clears_history() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = store_with(kv, StubChatClient::replying("")).await;
        store.create_conversation().await;

        assert!(logout(&BrokenAuth, &store).await.is_err());
        assert!(store.conversations().await.is_empty());
    }
}
