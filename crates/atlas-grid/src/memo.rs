//! Keyed memo cells for the derivation pipeline

use std::rc::Rc;

/// Caches the last value computed for a key.
///
/// A stage returns the same `Rc` for as long as its key compares equal, which
/// lets downstream stages and consumers compare outputs with `Rc::ptr_eq`.
#[derive(Debug)]
pub(crate) struct Memo<K, V> {
    slot: Option<(K, V)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<K: PartialEq, V: Clone> Memo<K, V> {
    /// Cached value for `key`, computing it on a miss. The flag is `true`
    /// when the value was recomputed.
    pub(crate) fn get_or_update(&mut self, key: K, compute: impl FnOnce() -> V) -> (V, bool) {
        if let Some((cached, value)) = &self.slot
            && *cached == key
        {
            return (value.clone(), false);
        }
        let value = compute();
        self.slot = Some((key, value.clone()));
        (value, true)
    }

    pub(crate) fn clear(&mut self) {
        self.slot = None;
    }
}

/// Compares an `Rc` by identity instead of by value
#[derive(Debug)]
pub(crate) struct RcKey<T>(pub(crate) Rc<T>);

impl<T> Clone for RcKey<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for RcKey<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
