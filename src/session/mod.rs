//! Tab-scoped persistence of the authenticated company.
//!
//! The stored record is `{company, timestamp, expiresIn?}`; a missing
//! `expiresIn` means the session lives as long as the tab does. Corrupt or
//! expired records self-heal: the value is cleared and the caller sees
//! "unauthenticated" instead of a crash.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use leptos::logging;
use serde::{Deserialize, Serialize};

use crate::models::Company;
use crate::util::now_ms;

pub(crate) const SESSION_KEY: &str = "balcao_company";

/// Tab-scoped key-value string storage.
pub(crate) trait SessionBackend {
    fn get(&self, key: &str) -> Option<String>;
    /// Returns false when the write was refused (quota, disabled storage).
    fn set(&self, key: &str, value: &str) -> bool;
    fn remove(&self, key: &str);
}

/// `sessionStorage`: scoped to the tab, gone when it closes.
pub(crate) struct WebSessionBackend;

impl WebSessionBackend {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.session_storage().ok().flatten())
    }
}

impl SessionBackend for WebSessionBackend {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set(&self, key: &str, value: &str) -> bool {
        Self::storage()
            .map(|s| s.set_item(key, value).is_ok())
            .unwrap_or(false)
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

/// Plain map backend for native tests.
pub(crate) struct MemorySessionBackend {
    map: RefCell<HashMap<String, String>>,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self {
            map: RefCell::new(HashMap::new()),
        }
    }
}

impl SessionBackend for MemorySessionBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&self, key: &str) {
        self.map.borrow_mut().remove(key);
    }
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    company: Company,
    timestamp: i64,
    #[serde(rename = "expiresIn", default, skip_serializing_if = "Option::is_none")]
    expires_in: Option<i64>,
}

#[derive(Clone)]
pub(crate) struct SessionStore {
    backend: Rc<dyn SessionBackend>,
    key: &'static str,
}

impl SessionStore {
    pub fn browser() -> Self {
        Self::with_backend(Rc::new(WebSessionBackend))
    }

    pub fn with_backend(backend: Rc<dyn SessionBackend>) -> Self {
        Self {
            backend,
            key: SESSION_KEY,
        }
    }

    /// Persist the company, optionally expiring after `expires_in_minutes`.
    /// Failures are logged and no-oped; a session that could not be saved
    /// just means the user logs in again next time.
    pub fn save(&self, company: &Company, expires_in_minutes: Option<i64>) {
        let record = SessionRecord {
            company: company.clone(),
            timestamp: now_ms(),
            expires_in: expires_in_minutes.map(|m| m * 60_000),
        };

        match serde_json::to_string(&record) {
            Ok(json) => {
                if !self.backend.set(self.key, &json) {
                    logging::warn!("session save refused by storage; nothing was saved");
                }
            }
            Err(err) => {
                logging::warn!("session save: could not serialize company: {err}");
            }
        }
    }

    /// The stored company, if present, parseable and not expired.
    pub fn load(&self) -> Option<Company> {
        let raw = self.backend.get(self.key)?;

        let record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                logging::warn!("session load: corrupt record, clearing: {err}");
                self.clear();
                return None;
            }
        };

        if let Some(window_ms) = record.expires_in {
            if now_ms() - record.timestamp > window_ms {
                logging::warn!("session expired, clearing");
                self.clear();
                return None;
            }
        }

        Some(record.company)
    }

    pub fn clear(&self) {
        self.backend.remove(self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> Company {
        Company {
            id: "co1".into(),
            name: "Mercearia Aurora".into(),
            cnpj: "12345678000199".into(),
            owner_id: "alice".into(),
        }
    }

    fn memory_store() -> (SessionStore, Rc<MemorySessionBackend>) {
        let backend = Rc::new(MemorySessionBackend::new());
        (SessionStore::with_backend(backend.clone()), backend)
    }

    #[test]
    fn test_save_load_round_trip() {
        let (store, _) = memory_store();
        assert!(store.load().is_none());

        store.save(&company(), None);
        assert_eq!(store.load(), Some(company()));

        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_without_expiry_never_expires() {
        let (store, backend) = memory_store();
        store.save(&company(), None);

        // Backdate the record far beyond any plausible window.
        let raw = backend.get(SESSION_KEY).expect("record stored");
        let mut v: serde_json::Value = serde_json::from_str(&raw).expect("record parses");
        v["timestamp"] = serde_json::json!(0);
        backend.set(SESSION_KEY, &v.to_string());

        assert_eq!(store.load(), Some(company()));
    }

    #[test]
    fn test_expired_record_clears_and_returns_none() {
        let (store, backend) = memory_store();
        store.save(&company(), Some(30));

        let raw = backend.get(SESSION_KEY).expect("record stored");
        let mut v: serde_json::Value = serde_json::from_str(&raw).expect("record parses");
        v["timestamp"] = serde_json::json!(now_ms() - 31 * 60_000);
        backend.set(SESSION_KEY, &v.to_string());

        assert!(store.load().is_none());
        assert!(
            backend.get(SESSION_KEY).is_none(),
            "expired record must be cleared as a side effect"
        );
    }

    #[test]
    fn test_unexpired_window_still_loads() {
        let (store, _) = memory_store();
        store.save(&company(), Some(30));
        assert_eq!(store.load(), Some(company()));
    }

    #[test]
    fn test_corrupt_record_self_heals() {
        let (store, backend) = memory_store();
        backend.set(SESSION_KEY, "{not json");

        assert!(store.load().is_none());
        assert!(backend.get(SESSION_KEY).is_none(), "corrupt record cleared");
    }
}
