//! Interned names for classes and fields.
//!
//! Class and field names are interned once at declaration time; everything
//! downstream (layouts, error messages, stats) carries a [`NameId`] and
//! resolves it back through the table only when rendering text.

use std::sync::Arc;

use ahash::AHashMap;

/// Id of an interned name. `u32` keeps layout slots and parameter lists
/// small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameId(u32);

/// Name interning table, owned by the heap.
///
/// Interning the same string twice returns the same id, so name equality
/// downstream is a plain id comparison.
#[derive(Debug, Default)]
pub(crate) struct NameTable {
    names: Vec<Arc<str>>,
    lookup: AHashMap<Arc<str>, NameId>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`, returning its id. Idempotent.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let id = NameId(self.names.len().try_into().expect("NameId overflow"));
        let shared: Arc<str> = Arc::from(name);
        self.names.push(Arc::clone(&shared));
        self.lookup.insert(shared, id);
        id
    }

    /// Looks up an already-interned name.
    pub fn get(&self, name: &str) -> Option<NameId> {
        self.lookup.get(name).copied()
    }

    /// Resolves an id back to its text.
    ///
    /// # Panics
    /// Panics if `id` did not come from this table.
    pub fn resolve(&self, id: NameId) -> &str {
        &self.names[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = NameTable::new();
        let a = table.intern("name");
        let b = table.intern("name");
        let c = table.intern("age");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.resolve(a), "name");
        assert_eq!(table.resolve(c), "age");
    }

    #[test]
    fn get_does_not_intern() {
        let mut table = NameTable::new();
        assert_eq!(table.get("missing"), None);
        let id = table.intern("present");
        assert_eq!(table.get("present"), Some(id));
    }
}
