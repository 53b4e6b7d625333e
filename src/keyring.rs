//! Round-robin pool of API tokens.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// Rotating token pool shared between concurrent callers.
///
/// [`next`](KeyRing::next) only takes the shared read lock and is safe under any
/// number of concurrent callers; [`append`](KeyRing::append) takes the exclusive
/// write lock.
///
/// ```rust
/// use anicine::keyring::KeyRing;
///
/// let ring = KeyRing::new(vec!["a".into(), "b".into()]);
/// assert_eq!(ring.next().as_deref(), Some("a"));
/// assert_eq!(ring.next().as_deref(), Some("b"));
/// assert_eq!(ring.next().as_deref(), Some("a"));
/// ```
#[derive(Debug, Default)]
pub struct KeyRing {
    keys: RwLock<Vec<String>>,
    cursor: AtomicUsize,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys: RwLock::new(keys),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Next token in rotation, `None` when the ring is empty.
    pub fn next(&self) -> Option<String> {
        let keys = self.keys.read();
        if keys.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % keys.len();
        keys.get(index).cloned()
    }

    /// Adds tokens at the end of the rotation.
    pub fn append(&self, keys: impl IntoIterator<Item = String>) {
        self.keys.write().extend(keys);
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}
