// ── Keyring-backed session store ──
//
// Keeps the same `{"token": "..."}` JSON the file store writes, under one
// keyring entry per profile.

use keyring::Entry;
use tracing::debug;

use metadmin_core::{CoreError, SessionStore, session::SESSION_STORAGE_KEY};

use crate::ConfigError;

/// Keyring service name shared by every profile.
pub const KEYRING_SERVICE: &str = "metadmin";

#[derive(Debug)]
pub struct KeyringSessionStore {
    entry: Entry,
}

impl KeyringSessionStore {
    /// Entry `metadmin` / `{profile}/auth-session`.
    pub fn new(profile_name: &str) -> Result<Self, ConfigError> {
        let entry = Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{SESSION_STORAGE_KEY}"))
            .map_err(|e| keyring_error("cannot open keyring entry", &e))?;
        Ok(Self { entry })
    }
}

fn keyring_error(context: &str, err: &keyring::Error) -> CoreError {
    CoreError::SessionStorage {
        message: format!("{context}: {err}"),
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Option<String>, CoreError> {
        match self.entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keyring_error("cannot read keyring", &e)),
        }
    }

    fn save(&self, value: &str) -> Result<(), CoreError> {
        self.entry
            .set_password(value)
            .map_err(|e| keyring_error("cannot write keyring", &e))?;
        debug!("session written to keyring");
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keyring_error("cannot clear keyring", &e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mock_store() -> KeyringSessionStore {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeyringSessionStore::new("test").unwrap()
    }

    #[test]
    fn empty_entry_loads_as_none() {
        let store = mock_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_load_clear() {
        let store = mock_store();
        store.save(r#"{"token":"t1"}"#).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(r#"{"token":"t1"}"#));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }
}
