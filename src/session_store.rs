//! # Session Store Module
//!
//! In-memory dialogue storage with per-chat expiry. Each chat's state lives
//! for `ttl` after its last update; an expired state reads as absent, so the
//! conversation restarts from the menu. [`ExpiringStorage::purge_expired`]
//! drops expired entries and is run periodically from `main`.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::dispatching::dialogue::Storage;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tracing::debug;

/// Default lifetime of an idle conversation
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry<D> {
    dialogue: D,
    touched_at: Instant,
}

/// Dialogue storage whose entries expire after a period of inactivity
pub struct ExpiringStorage<D> {
    map: Mutex<HashMap<ChatId, Entry<D>>>,
    ttl: Duration,
}

impl<D> ExpiringStorage<D> {
    #[must_use]
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            map: Mutex::new(HashMap::new()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut map = self.map.lock().await;
        let before = map.len();
        map.retain(|_, entry| entry.touched_at.elapsed() < self.ttl);
        let purged = before - map.len();
        if purged > 0 {
            debug!(purged, remaining = map.len(), "Purged expired dialogue sessions");
        }
        purged
    }

    /// Number of stored entries, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.map.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.map.lock().await.is_empty()
    }
}

impl<D> Storage<D> for ExpiringStorage<D>
where
    D: Clone + Send + 'static,
{
    type Error = Infallible;

    fn remove_dialogue(self: Arc<Self>, chat_id: ChatId) -> BoxFuture<'static, Result<(), Self::Error>>
    where
        D: Send + 'static,
    {
        Box::pin(async move {
            self.map.lock().await.remove(&chat_id);
            Ok(())
        })
    }

    fn update_dialogue(
        self: Arc<Self>,
        chat_id: ChatId,
        dialogue: D,
    ) -> BoxFuture<'static, Result<(), Self::Error>>
    where
        D: Send + 'static,
    {
        Box::pin(async move {
            self.map.lock().await.insert(
                chat_id,
                Entry {
                    dialogue,
                    touched_at: Instant::now(),
                },
            );
            Ok(())
        })
    }

    fn get_dialogue(self: Arc<Self>, chat_id: ChatId) -> BoxFuture<'static, Result<Option<D>, Self::Error>> {
        Box::pin(async move {
            let mut map = self.map.lock().await;
            let expired = match map.get(&chat_id) {
                Some(entry) if entry.touched_at.elapsed() < self.ttl => return Ok(Some(entry.dialogue.clone())),
                Some(_) => true,
                None => false,
            };
            if expired {
                debug!(chat_id = %chat_id, "Dialogue session expired");
                map.remove(&chat_id);
            }
            Ok(None)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_and_get() {
        let storage = ExpiringStorage::<String>::new(Duration::from_secs(60));
        let chat = ChatId(42);

        Arc::clone(&storage).update_dialogue(chat, "waiting".to_string()).await.unwrap();
        let state = Arc::clone(&storage).get_dialogue(chat).await.unwrap();
        assert_eq!(state.as_deref(), Some("waiting"));

        Arc::clone(&storage).remove_dialogue(chat).await.unwrap();
        assert_eq!(Arc::clone(&storage).get_dialogue(chat).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let storage = ExpiringStorage::<String>::new(Duration::from_secs(60));
        assert!(Arc::clone(&storage).remove_dialogue(ChatId(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let storage = ExpiringStorage::<u32>::new(Duration::ZERO);
        Arc::clone(&storage).update_dialogue(ChatId(7), 3).await.unwrap();

        assert_eq!(Arc::clone(&storage).get_dialogue(ChatId(7)).await.unwrap(), None);
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let storage = ExpiringStorage::<u32>::new(Duration::from_millis(20));
        assert_eq!(storage.ttl(), Duration::from_millis(20));
        Arc::clone(&storage).update_dialogue(ChatId(1), 1).await.unwrap();
        Arc::clone(&storage).update_dialogue(ChatId(2), 2).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        Arc::clone(&storage).update_dialogue(ChatId(3), 3).await.unwrap();

        assert_eq!(storage.purge_expired().await, 2);
        assert_eq!(storage.len().await, 1);
        assert_eq!(Arc::clone(&storage).get_dialogue(ChatId(3)).await.unwrap(), Some(3));
    }
}
