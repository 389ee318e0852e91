use parking_lot::Mutex;
use std::collections::HashMap;

/// String key-value store holding the shared JWKS cache blob.
///
/// Each call must touch a single key in a single operation; a `set_str`
/// either lands the whole value or nothing.
pub trait KvStore: Send + Sync {
    fn get_str(&self, key: &str) -> Option<String>;
    fn set_str(&self, key: &str, value: String);
}

/// In-process store, good enough for a single worker or for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get_str(&self, key: &str) -> Option<String> {
        self.inner.lock().get(key).cloned()
    }

    fn set_str(&self, key: &str, value: String) {
        self.inner.lock().insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_overwrites() {
        let store = MemoryStore::new();
        assert_eq!(store.get_str("k"), None);
        store.set_str("k", "one".into());
        store.set_str("k", "two".into());
        assert_eq!(store.get_str("k").as_deref(), Some("two"));
    }
}
