use crate::{LookupError, LookupResult};
use std::collections::HashMap;

/// An insertion-ordered interning set of strings.
///
/// Every distinct value gets a stable index assigned at first insertion.
/// Inserting a duplicate with `allow_duplicate` re-appends the value for
/// positional iteration (encoded maps may legitimately repeat a source) but
/// never changes the index of the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct OrderedSet {
    indices: HashMap<String, u32>,
    items: Vec<String>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iter_with_duplicates<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut set = Self::new();
        for value in values {
            set.add(&value.into(), true);
        }
        set
    }

    /// Inserts `value` and returns its index.
    ///
    /// A duplicate keeps the index of the first occurrence; it is appended
    /// to the positional sequence only when `allow_duplicate` is set.
    pub fn add(&mut self, value: &str, allow_duplicate: bool) -> u32 {
        match self.indices.get(value) {
            Some(&idx) => {
                if allow_duplicate {
                    self.items.push(value.to_owned());
                }
                idx
            }
            None => {
                let idx = self.items.len() as u32;
                self.indices.insert(value.to_owned(), idx);
                self.items.push(value.to_owned());
                idx
            }
        }
    }

    #[inline]
    pub fn has(&self, value: &str) -> bool {
        self.indices.contains_key(value)
    }

    /// Returns the index of `value`, failing when it was never interned.
    pub fn index_of(&self, value: &str) -> LookupResult<u32> {
        self.indices
            .get(value)
            .copied()
            .ok_or_else(|| LookupError::NotFound(value.to_owned()))
    }

    /// Returns the value at a positional index.
    pub fn at(&self, index: u32) -> LookupResult<&str> {
        self.items
            .get(index as usize)
            .map(String::as_str)
            .ok_or(LookupError::IndexOutOfRange {
                index,
                len: self.items.len() as u32,
            })
    }

    /// Number of distinct values.
    #[inline]
    pub fn len(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Number of positional entries, counting duplicates.
    #[inline]
    pub(crate) fn seq_len(&self) -> u32 {
        self.items.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// The values in insertion order, as independent copies.
    pub fn to_vec(&self) -> Vec<String> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedSet;
    use crate::LookupError;

    #[test]
    fn test_insertion_order_defines_index() {
        let mut set = OrderedSet::new();
        assert_eq!(set.add("a.js", false), 0);
        assert_eq!(set.add("b.js", false), 1);
        assert_eq!(set.add("a.js", false), 0);
        assert_eq!(set.len(), 2);
        assert_eq!(set.at(0).unwrap(), "a.js");
        assert_eq!(set.at(1).unwrap(), "b.js");
        assert_eq!(set.index_of("b.js").unwrap(), 1);
        assert_eq!(set.to_vec(), vec!["a.js".to_owned(), "b.js".to_owned()]);
    }

    #[test]
    fn test_duplicates_keep_first_index() {
        let mut set = OrderedSet::new();
        set.add("x", true);
        set.add("y", true);
        assert_eq!(set.add("x", true), 0);
        // re-appended positionally, still one distinct value "x"
        assert_eq!(set.len(), 2);
        assert_eq!(set.at(2).unwrap(), "x");
        assert_eq!(set.index_of("x").unwrap(), 0);
    }

    #[test]
    fn test_strict_lookups_fail() {
        let mut set = OrderedSet::new();
        set.add("only", false);
        assert!(matches!(
            set.index_of("missing"),
            Err(LookupError::NotFound(..))
        ));
        assert!(matches!(
            set.at(7),
            Err(LookupError::IndexOutOfRange { index: 7, len: 1 })
        ));
    }

    #[test]
    fn test_reserved_looking_keys_are_plain_values() {
        let mut set = OrderedSet::new();
        set.add("__proto__", false);
        set.add("constructor", false);
        assert!(set.has("__proto__"));
        assert_eq!(set.index_of("constructor").unwrap(), 1);
    }
}
