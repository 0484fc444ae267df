use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::utils::Result;

/// Volatile store, used by tests and by the CLI's `--ephemeral` mode.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("itemsCount").await.unwrap(), None);

        store.set("itemsCount", "3").await.unwrap();
        assert_eq!(store.get("itemsCount").await.unwrap().as_deref(), Some("3"));
        assert!(store.contains("itemsCount").await.unwrap());

        store.remove("itemsCount").await.unwrap();
        store.remove("itemsCount").await.unwrap();
        assert!(!store.contains("itemsCount").await.unwrap());
    }
}
