use crate::SessionStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Durable-store keys shared between the service and the driver binary.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER: &str = "user";
    pub const USER_EMAIL: &str = "userEmail";
    pub const USER_ROLE: &str = "userRole";
    pub const LIVE_SESSION_ID: &str = "live_session_id";
    pub const ACTIVE_DASHBOARD_SESSION: &str = "active_dashboard_session";
    pub const SELECTED_CATEGORY: &str = "selected_category";
    pub const SELECTED_REGION: &str = "selected_region";
}

/// In-memory [`SessionStore`], used by tests and short-lived tooling that
/// has no state file to persist.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
    }
}
