// src/server/session.rs
use crate::connectors::traits::TradingApi;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Maps session tokens to authenticated client handles.
///
/// The handle is the only thing handed to the pipeline; the credentials
/// behind it live inside the client and are never stored elsewhere.
/// Dropping the entry ends the session.
#[derive(Default)]
pub struct SessionStore {
    clients: RwLock<HashMap<Uuid, Arc<dyn TradingApi>>>,
}

impl SessionStore {
    pub async fn insert(&self, client: Arc<dyn TradingApi>) -> Uuid {
        let token = Uuid::new_v4();
        self.clients.write().await.insert(token, client);
        token
    }

    pub async fn get(&self, token: &Uuid) -> Option<Arc<dyn TradingApi>> {
        self.clients.read().await.get(token).cloned()
    }

    pub async fn remove(&self, token: &Uuid) -> bool {
        self.clients.write().await.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::mock::MockApi;

    #[tokio::test]
    async fn tokens_are_unique_and_resolvable() {
        let store = SessionStore::default();

        let a = store.insert(Arc::new(MockApi::default())).await;
        let b = store.insert(Arc::new(MockApi::default())).await;

        assert_ne!(a, b);
        assert!(store.get(&a).await.is_some());
        assert!(store.get(&b).await.is_some());
    }

    #[tokio::test]
    async fn removed_session_is_gone() {
        let store = SessionStore::default();
        let token = store.insert(Arc::new(MockApi::default())).await;

        assert!(store.remove(&token).await);
        assert!(store.get(&token).await.is_none());
        // Second removal is a no-op.
        assert!(!store.remove(&token).await);
    }

    #[tokio::test]
    async fn unknown_token_resolves_to_nothing() {
        let store = SessionStore::default();
        assert!(store.get(&Uuid::new_v4()).await.is_none());
    }
}
