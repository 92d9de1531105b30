use std::collections::HashMap;

use crate::doc::Document;
use crate::options::ParseOptions;

const DEFAULT_CAPACITY: usize = 16;

struct Slot {
    doc: Document,
    stamp: u64,
}

/// Keeps parsed documents alive across uses, keyed by an opaque token
/// (usually the source path or a request id). Recency is a monotonic
/// sequence stamp bumped on every access; when the cache outgrows its
/// capacity the entry with the smallest stamp is dropped.
pub struct DocumentCache {
    slots: HashMap<String, Slot>,
    capacity: usize,
    clock: u64,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.slots.contains_key(token)
    }

    /// Fetch the document for `token`, creating an empty one on a miss.
    /// Either way the entry becomes the most recently used.
    pub fn get(&mut self, token: &str) -> &mut Document {
        self.clock += 1;
        let stamp = self.clock;
        if !self.slots.contains_key(token) && self.slots.len() >= self.capacity {
            self.evict_oldest();
        }
        let slot = self.slots.entry(token.to_string()).or_insert_with(|| Slot {
            doc: Document::new(),
            stamp,
        });
        slot.stamp = stamp;
        &mut slot.doc
    }

    /// Parse `text` into the slot for `token`, reusing the cached document
    /// when present.
    pub fn load(&mut self, token: &str, text: &str, options: &ParseOptions) -> &mut Document {
        let doc = self.get(token);
        doc.reparse(text, options);
        doc
    }

    /// Hand over a ready-made document.
    pub fn put(&mut self, token: &str, doc: Document) {
        self.clock += 1;
        let stamp = self.clock;
        if !self.slots.contains_key(token) && self.slots.len() >= self.capacity {
            self.evict_oldest();
        }
        let slot = self.slots.entry(token.to_string()).or_insert_with(|| Slot {
            doc: Document::new(),
            stamp,
        });
        slot.doc = doc;
        slot.stamp = stamp;
    }

    pub fn remove(&mut self, token: &str) -> Option<Document> {
        self.slots.remove(token).map(|slot| slot.doc)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.stamp)
            .map(|(token, _)| token.clone());
        if let Some(token) = oldest {
            self.slots.remove(&token);
        }
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_miss_creates_an_empty_document() {
        let mut cache = DocumentCache::new();
        assert!(!cache.contains("a"));
        let doc = cache.get("a");
        assert!(doc.is_unset(doc.root()));
        assert!(cache.contains("a"));
        assert_eq!(cache.len(), 1);
    }

    #[rstest::rstest]
    fn test_hit_returns_the_same_tree() {
        let mut cache = DocumentCache::new();
        cache
            .load("cfg", r#"{"port": 8080}"#, &ParseOptions::default());
        let doc = cache.get("cfg");
        assert_eq!(doc.int_at("port", 0), 8080);

        doc.put_number("port", 9090.0).unwrap();
        assert_eq!(cache.get("cfg").int_at("port", 0), 9090);
    }

    #[rstest::rstest]
    fn test_eviction_drops_least_recently_used() {
        let mut cache = DocumentCache::with_capacity(2);
        cache.get("a");
        cache.get("b");
        cache.get("a"); // refresh a, making b the oldest
        cache.get("c");
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[rstest::rstest]
    fn test_put_replaces_and_remove_returns() {
        let mut cache = DocumentCache::new();
        cache.put("t", Document::parse("[1]"));
        cache.put("t", Document::parse("[1, 2]"));
        assert_eq!(cache.len(), 1);
        let mut doc = cache.remove("t").unwrap();
        assert_eq!(doc.len(doc.root()), 2);
        assert!(cache.is_empty());
        assert!(cache.remove("t").is_none());
        let _ = doc.text();
    }

    #[rstest::rstest]
    fn test_capacity_floor_is_one() {
        let mut cache = DocumentCache::with_capacity(0);
        cache.get("a");
        cache.get("b");
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));
    }
}
