//! The in-memory key/value map (C3): many concurrent readers, mutually
//! exclusive writers, no size limits.

use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct Store {
    values: RwLock<HashMap<String, String>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, or `None` if absent. Never errors.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    /// Inserts or overwrites `key`. Always succeeds.
    pub fn set(&self, key: String, value: String) {
        self.values.write().insert(key, value);
    }

    /// Removes `key`. A no-op, not an error, if `key` is absent.
    pub fn del(&self, key: &str) {
        self.values.write().remove(key);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn get_on_empty_store_is_none() {
        let store = Store::new();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = Store::new();
        store.set("k".into(), "v".into());
        assert_eq!(store.get("k"), Some("v".into()));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let store = Store::new();
        store.set("k".into(), "v1".into());
        store.set("k".into(), "v2".into());
        assert_eq!(store.get("k"), Some("v2".into()));
    }

    #[test]
    fn del_on_absent_key_is_a_no_op_success() {
        let store = Store::new();
        store.del("missing");
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn del_removes_key() {
        let store = Store::new();
        store.set("k".into(), "v".into());
        store.del("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn concurrent_readers_and_writers_do_not_corrupt_state() {
        let store = Arc::new(Store::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                store.set(format!("k{i}"), format!("v{i}"));
                let _ = store.get(&format!("k{i}"));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 50);
    }
}
