//! LRU cache for query embeddings.
//!
//! Recommendation queries repeat heavily (same goal, focus and location
//! for every user with a similar profile), so query vectors are memoized.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use ndarray::Array1;
use parking_lot::Mutex;

struct CacheEntry {
    embedding: Array1<f32>,
    inserted_at: Instant,
}

/// Thread-safe LRU cache with a TTL.
pub struct QueryCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Least recently used at the front.
    order: VecDeque<String>,
    max_size: usize,
    ttl: Duration,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

impl QueryCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: VecDeque::with_capacity(max_size),
                max_size,
                ttl,
            }),
        }
    }

    /// Get a cached embedding. Returns None on miss or expired entry.
    pub fn get(&self, query: &str) -> Option<Array1<f32>> {
        let mut inner = self.inner.lock();
        let ttl = inner.ttl;

        let (embedding, expired) = match inner.entries.get(query) {
            Some(entry) => (entry.embedding.clone(), entry.inserted_at.elapsed() >= ttl),
            None => return None,
        };

        if expired {
            inner.remove(query);
            return None;
        }
        inner.touch(query);
        Some(embedding)
    }

    pub fn put(&self, query: String, embedding: Array1<f32>) {
        let mut inner = self.inner.lock();
        if inner.max_size == 0 {
            return;
        }

        let entry = CacheEntry {
            embedding,
            inserted_at: Instant::now(),
        };
        if inner.entries.insert(query.clone(), entry).is_some() {
            inner.touch(&query);
            return;
        }

        inner.order.push_back(query);
        while inner.entries.len() > inner.max_size {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}
