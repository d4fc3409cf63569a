use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryIdCacheEntry {
    pub id: String,
    pub resolved_at: Instant,
}

/// Single slot holding the last resolved directory id. Reads never return
/// an expired value; an expired entry is dropped on the read that finds it.
#[derive(Debug, Clone)]
pub struct DirectoryIdCache {
    slot: Option<DirectoryIdCacheEntry>,
    ttl: Duration,
}

impl DirectoryIdCache {
    pub fn new(ttl: Duration) -> Self {
        Self { slot: None, ttl }
    }

    pub fn get(&mut self) -> Option<&str> {
        let expired = self
            .slot
            .as_ref()
            .is_some_and(|entry| entry.resolved_at.elapsed() >= self.ttl);
        if expired {
            self.slot = None;
        }
        self.slot.as_ref().map(|entry| entry.id.as_str())
    }

    pub fn store(&mut self, id: &str) {
        self.slot = Some(DirectoryIdCacheEntry {
            id: id.to_string(),
            resolved_at: Instant::now(),
        });
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
