use log::error;
use roadcore::SessionStore;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::{fs, path::Path};

use anyhow::Context;

/// JSON-file-backed [`SessionStore`]: the durable home of the bearer token,
/// the cached profile, and the session markers across process restarts.
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Loads the state file, starting empty when it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("parsing state file {}", path.display()))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading state file {}", path.display()))
            }
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn persist(&self, values: &HashMap<String, String>) {
        match serde_json::to_string_pretty(values) {
            Ok(serialized) => {
                if let Err(err) = fs::write(&self.path, serialized) {
                    error!("writing state file {}: {}", self.path.display(), err);
                }
            }
            Err(err) => error!("serializing client state: {}", err),
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
            self.persist(&values);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            if values.remove(key).is_some() {
                self.persist(&values);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadcore::service::keys;
    use tempfile::TempDir;

    #[test]
    fn values_survive_reopening_the_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::TOKEN, "abc123");
        store.set(keys::LIVE_SESSION_ID, "S1");
        store.remove(keys::LIVE_SESSION_ID);
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOKEN).as_deref(), Some("abc123"));
        assert_eq!(reopened.get(keys::LIVE_SESSION_ID), None);
    }

    #[test]
    fn missing_state_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get(keys::TOKEN), None);
    }
}
