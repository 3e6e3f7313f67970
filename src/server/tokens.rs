//! Bearer tokens handed out by the score server (sessions and attestations).
//!
//! Tokens expire `ttl` after issue. Expired entries are swept whenever a new
//! token is issued, and the registry never holds more than `capacity` live
//! tokens: the oldest one is evicted to make room.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

/// Upper bound on live tokens per registry.
pub const MAX_LIVE_TOKENS: usize = 10_000;

struct Issued<V> {
    value: V,
    issued_at: Instant,
}

pub struct TokenRegistry<V> {
    ttl: Duration,
    capacity: usize,
    tokens: RwLock<HashMap<String, Issued<V>>>,
}

impl<V: Clone> TokenRegistry<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Mint a fresh token bound to `value`.
    pub async fn issue(&self, value: V) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, issued| now.duration_since(issued.issued_at) < self.ttl);

        if tokens.len() >= self.capacity {
            let oldest = tokens
                .iter()
                .min_by_key(|(_, issued)| issued.issued_at)
                .map(|(token, _)| token.clone());
            if let Some(oldest) = oldest {
                tokens.remove(&oldest);
            }
        }

        tokens.insert(
            token.clone(),
            Issued {
                value,
                issued_at: now,
            },
        );
        token
    }

    /// The value bound to `token`, unless it is unknown or expired.
    pub async fn get(&self, token: &str) -> Option<V> {
        let tokens = self.tokens.read().await;
        let issued = tokens.get(token)?;
        (issued.issued_at.elapsed() < self.ttl).then(|| issued.value.clone())
    }

    /// Entries currently held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokens_expire_and_are_swept() {
        let registry = TokenRegistry::new(Duration::from_secs(60), 100);

        let old = registry.issue("uid-1".to_string()).await;
        assert_eq!(registry.get(&old).await.as_deref(), Some("uid-1"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(registry.get(&old).await, None);
        assert_eq!(registry.len().await, 1);

        let fresh = registry.issue("uid-2".to_string()).await;
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get(&fresh).await.as_deref(), Some("uid-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest() {
        let registry = TokenRegistry::new(Duration::from_secs(3600), 2);

        let first = registry.issue(1).await;
        tokio::time::advance(Duration::from_millis(10)).await;
        let second = registry.issue(2).await;
        tokio::time::advance(Duration::from_millis(10)).await;
        let third = registry.issue(3).await;

        assert_eq!(registry.len().await, 2);
        assert_eq!(registry.get(&first).await, None);
        assert_eq!(registry.get(&second).await, Some(2));
        assert_eq!(registry.get(&third).await, Some(3));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let registry: TokenRegistry<()> = TokenRegistry::new(Duration::from_secs(1), 1);
        assert_eq!(registry.get("nope").await, None);
    }
}
