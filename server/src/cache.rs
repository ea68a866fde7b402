use crate::config::CacheSettings;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Identifies a cached page. Pages are cached separately for every client,
/// since their contents depend on who is viewing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    uri: String,
    client_id: Option<i64>,
}

impl CacheKey {
    pub fn new(uri: impl Into<String>, client_id: Option<i64>) -> Self {
        Self {
            uri: uri.into(),
            client_id,
        }
    }
}

struct CachedPage {
    key: CacheKey,
    inserted_at: Instant,
    html: String,
}

/// A ring buffer of rendered pages. Entries expire after a fixed timeout and
/// the oldest entry is evicted once the buffer is full.
pub struct PageCache {
    data: VecDeque<CachedPage>,
    max_entries: usize,
    timeout: Duration,
}

impl PageCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            data: VecDeque::new(),
            max_entries: settings.max_entries,
            timeout: Duration::from_secs(settings.index_timeout),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_entries > 0 && !self.timeout.is_zero()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&mut self) {
        self.data = VecDeque::new();
    }

    /// Returns the cached html of the page identified by `key`, if it hasn't expired.
    pub fn get(&mut self, key: &CacheKey) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&mut self, key: CacheKey, html: String) {
        self.insert_at(key, html, Instant::now());
    }

    fn get_at(&mut self, key: &CacheKey, now: Instant) -> Option<String> {
        self.evict_expired(now);
        self.data
            .iter()
            .find(|page| &page.key == key)
            .map(|page| page.html.clone())
    }

    fn insert_at(&mut self, key: CacheKey, html: String, now: Instant) {
        if !self.is_enabled() {
            return;
        }

        self.data.retain(|page| page.key != key);
        self.data.push_back(CachedPage {
            key,
            inserted_at: now,
            html,
        });
        while self.data.len() > self.max_entries {
            self.data.pop_front();
        }
    }

    /// Entries are stored in insertion order, so expired entries are always at the front.
    fn evict_expired(&mut self, now: Instant) {
        while let Some(page) = self.data.front() {
            if now.saturating_duration_since(page.inserted_at) < self.timeout {
                break;
            }
            self.data.pop_front();
        }
    }
}
