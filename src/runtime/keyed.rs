//! KeyedEffect - dependency-gated setup/teardown.
//!
//! `run(key, setup)` runs the previous teardown and then `setup` exactly when
//! `key` differs from the key of the last successful setup. Identical keys do
//! nothing at all. `dispose()` runs the outstanding teardown.
//!
//! This is the single lifecycle shape behind entity ownership, component
//! attachment and collection provisioning.

use crate::error::Result;
use crate::runtime::Cleanup;

/// Setup/teardown gated on a comparison key.
pub struct KeyedEffect<K> {
    key: Option<K>,
    teardown: Option<Cleanup>,
}

impl<K> Default for KeyedEffect<K> {
    fn default() -> Self {
        Self {
            key: None,
            teardown: None,
        }
    }
}

impl<K: PartialEq> KeyedEffect<K> {
    /// Create an effect that has not run yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `setup` if `key` changed. Returns whether it ran.
    ///
    /// If `setup` fails, the key is forgotten so the next call retries.
    pub fn run<F>(&mut self, key: K, setup: F) -> Result<bool>
    where
        F: FnOnce(&K) -> Result<Option<Cleanup>>,
    {
        if self.key.as_ref() == Some(&key) {
            return Ok(false);
        }

        self.dispose();

        let teardown = setup(&key)?;
        self.key = Some(key);
        self.teardown = teardown;
        Ok(true)
    }

    /// Key of the last successful setup.
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }
}

impl<K> KeyedEffect<K> {
    /// Run the outstanding teardown, if any.
    pub fn dispose(&mut self) {
        self.key = None;
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl<K> Drop for KeyedEffect<K> {
    fn drop(&mut self) {
        self.dispose();
    }
}
