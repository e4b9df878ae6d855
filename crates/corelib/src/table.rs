//! Fixed-capacity, index-addressed storage for models and entities.

use crate::{SceneError, SceneResult};

/// Dense table that refuses to grow past its capacity.
/// Slots are never removed, so an index stays valid for the table's lifetime.
#[derive(Clone, Debug)]
pub struct FixedTable<T> {
    items: Vec<T>,
    capacity: usize,
    what: &'static str,
}

impl<T> FixedTable<T> {
    /// `what` names the contents in capacity errors ("models", "entities").
    pub fn new(what: &'static str, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            what,
        }
    }

    /// Append an item and return its index.
    pub fn push(&mut self, item: T) -> SceneResult<usize> {
        if self.items.len() >= self.capacity {
            return Err(SceneError::CapacityExceeded {
                what: self.what,
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_dense_indices() {
        let mut t = FixedTable::new("models", 3);
        assert_eq!(t.push('a').unwrap(), 0);
        assert_eq!(t.push('b').unwrap(), 1);
        assert_eq!(t.get(1), Some(&'b'));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn overflow_is_an_error_and_keeps_contents() {
        let mut t = FixedTable::new("models", 1);
        t.push(1).unwrap();
        let err = t.push(2).unwrap_err();
        assert!(matches!(
            err,
            SceneError::CapacityExceeded { what: "models", capacity: 1 }
        ));
        assert_eq!(err.to_string(), "too many models: capacity is 1");
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0), Some(&1));
    }
}
