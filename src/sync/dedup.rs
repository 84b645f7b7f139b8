//! Last-seen deployment address per contract name.

use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory map from contract name to the last address it was synced at.
///
/// Lives for the process lifetime and is never persisted. The map sits
/// behind a mutex so that [`observe`](Self::observe) reads and writes an
/// entry without another event slipping in between.
#[derive(Debug, Default)]
pub struct AddressDedupTracker {
    addresses: Mutex<HashMap<String, String>>,
}

impl AddressDedupTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `address` is a new deployment of `name`.
    ///
    /// `None` never syncs.
    #[must_use]
    pub fn should_sync(&self, name: &str, address: Option<&str>) -> bool {
        let Some(address) = address else {
            return false;
        };
        self.lock().get(name).map(String::as_str) != Some(address)
    }

    /// Record `address` as the last seen deployment of `name`.
    pub fn record(&self, name: &str, address: &str) {
        self.lock().insert(name.to_string(), address.to_string());
    }

    /// Check and record in one step; returns whether the artifact must be
    /// synced.
    pub fn observe(&self, name: &str, address: Option<&str>) -> bool {
        let Some(address) = address else {
            return false;
        };
        let mut addresses = self.lock();
        if addresses.get(name).map(String::as_str) == Some(address) {
            return false;
        }
        addresses.insert(name.to_string(), address.to_string());
        true
    }

    /// Last recorded address for `name`.
    #[must_use]
    pub fn last_address(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.addresses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
