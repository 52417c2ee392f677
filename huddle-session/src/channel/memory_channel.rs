use crate::channel::SharedChannel;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::ChannelError;
use std::sync::Arc;

/// In-process store. Clones share the same map, so host and participant
/// running in one process see each other's writes immediately.
#[derive(Clone, Default, Debug)]
pub struct MemoryChannel {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SharedChannel for MemoryChannel {
    async fn write(&self, key: &str, value: String) -> Result<(), ChannelError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>, ChannelError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), ChannelError> {
        self.entries.remove(key);
        Ok(())
    }
}
