//! Interned names for the declaration graph.
//!
//! Every name stored in a graph comes from that graph's [`StringCache`], so
//! equal names share one allocation and compare cheaply.

use std::sync::Arc;

use rustc_hash::FxHashSet;

/// An interned name.
pub type Symbol = Arc<str>;

/// Deduplicating storage for the names of one declaration graph.
#[derive(Debug, Default, Clone)]
pub struct StringCache {
    strings: FxHashSet<Arc<str>>,
}

impl StringCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared copy of `text`, storing it on first use.
    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(existing) = self.strings.get(text) {
            return Arc::clone(existing);
        }
        let symbol: Symbol = Arc::from(text);
        self.strings.insert(Arc::clone(&symbol));
        symbol
    }

    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.strings.get(text).cloned()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.strings.contains(text)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_names_share_storage() {
        let mut cache = StringCache::new();
        let a = cache.intern("vtkObject");
        let b = cache.intern(&String::from("vtkObject"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn lookup_without_inserting() {
        let mut cache = StringCache::new();
        assert!(cache.get("Foo").is_none());
        cache.intern("Foo");
        assert!(cache.contains("Foo"));
        assert_eq!(cache.get("Foo").as_deref(), Some("Foo"));
    }
}
