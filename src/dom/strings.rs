//! String Interning Pool
//!
//! Deduplicated storage for element/attribute names, namespace URIs and
//! text content. Node payloads carry `StrId` handles instead of owned
//! strings, keeping the arena compact.
//!
//! Uses hash-based lookup to avoid storing duplicate string data.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Identifier of an interned string. Id 0 is the empty string.
pub type StrId = u32;

/// String interning pool
///
/// Memory layout:
/// - `entries`: (offset, len) into `data` for each interned string id
/// - `data`: one contiguous buffer holding every unique string
/// - `hash_index`: hash -> list of ids (handles rare collisions)
#[derive(Debug, Default)]
pub struct StringPool {
    /// Entries indexed by string id
    entries: Vec<(u32, u32)>,
    /// Buffer holding all interned string content
    data: String,
    /// Hash of string content -> list of ids with that hash
    hash_index: HashMap<u64, Vec<StrId>>,
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            data: String::with_capacity(1024),
            hash_index: HashMap::new(),
        };
        // Entry 0 is reserved for the empty string
        pool.entries.push((0, 0));
        pool
    }

    /// Compute hash of string content
    #[inline]
    fn compute_hash(s: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning the id of the existing entry if the
    /// content was seen before
    pub fn intern(&mut self, s: &str) -> StrId {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);

        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == s {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);

        let id = self.entries.len() as StrId;
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);

        id
    }

    /// Get a string by id. Unknown ids resolve to the empty string.
    pub fn get(&self, id: StrId) -> &str {
        match self.entries.get(id as usize) {
            Some(&(offset, len)) => {
                let start = offset as usize;
                let end = start + len as usize;
                self.data.get(start..end).unwrap_or("")
            }
            None => "",
        }
    }

    /// Get the number of unique strings stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pool holds nothing beyond the reserved empty string
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Get total bytes used for string storage
    pub fn bytes_used(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_get() {
        let mut pool = StringPool::new();
        let id = pool.intern("hello");
        assert!(id > 0);
        assert_eq!(pool.get(id), "hello");
    }

    #[test]
    fn test_intern_duplicate() {
        let mut pool = StringPool::new();
        let id1 = pool.intern("hello");
        let id2 = pool.intern("hello");
        assert_eq!(id1, id2);
        assert_eq!(pool.bytes_used(), 5);
    }

    #[test]
    fn test_intern_different() {
        let mut pool = StringPool::new();
        let id1 = pool.intern("hello");
        let id2 = pool.intern("world");
        assert_ne!(id1, id2);
        assert_eq!(pool.get(id1), "hello");
        assert_eq!(pool.get(id2), "world");
    }

    #[test]
    fn test_empty_string() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get(0), "");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let pool = StringPool::new();
        assert_eq!(pool.get(999), "");
    }
}
