// ── Auth session context ──
//
// Holds the in-memory session and mirrors it to a persistent store. The
// store is only read by `restore()`; afterwards the in-memory copy is the
// single source of truth for request headers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use metadmin_api::AuthSession;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Name under which the session is persisted.
pub const SESSION_STORAGE_KEY: &str = "auth-session";

/// Serialized form of a persisted session: `{"token": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
}

impl From<&AuthSession> for StoredSession {
    fn from(session: &AuthSession) -> Self {
        Self {
            token: session.token().expose_secret().to_owned(),
        }
    }
}

/// Whether `session` carries a usable token.
pub fn is_authenticated(session: Option<&AuthSession>) -> bool {
    session.is_some_and(AuthSession::is_valid)
}

// ── Stores ──────────────────────────────────────────────────────────

/// Persistent key-value slot for the session.
pub trait SessionStore: Send + Sync {
    /// Read the raw stored value, if any.
    fn load(&self) -> Result<Option<String>, CoreError>;
    fn save(&self, value: &str) -> Result<(), CoreError>;
    fn clear(&self) -> Result<(), CoreError>;
}

fn storage_error(context: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::SessionStorage {
        message: format!("{context}: {err}"),
    }
}

/// Session persisted as `auth-session.json` in a data directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in `dir/auth-session.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{SESSION_STORAGE_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, CoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| storage_error(&format!("cannot read {}", self.path.display()), e))
    }

    fn save(&self, value: &str) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| storage_error(&format!("cannot create {}", parent.display()), e))?;
        }
        std::fs::write(&self.path, value)
            .map_err(|e| storage_error(&format!("cannot write {}", self.path.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)
                .map_err(|e| storage_error("cannot restrict session file", e))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(
                &format!("cannot remove {}", self.path.display()),
                e,
            )),
        }
    }
}

/// Process-local store, for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: ArcSwapOption<String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            slot: ArcSwapOption::from_pointee(value.into()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, CoreError> {
        Ok(self.slot.load_full().map(|v| v.as_ref().clone()))
    }

    fn save(&self, value: &str) -> Result<(), CoreError> {
        self.slot.store(Some(Arc::new(value.to_owned())));
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.slot.store(None);
        Ok(())
    }
}

// ── Context ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

struct SessionInner {
    current: ArcSwapOption<AuthSession>,
    store: Arc<dyn SessionStore>,
    state_tx: watch::Sender<SessionState>,
}

/// Shared handle to the current session. Cheap to clone.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// A context with no session, backed by `store`.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Anonymous);
        Self {
            inner: Arc::new(SessionInner {
                current: ArcSwapOption::empty(),
                store,
                state_tx,
            }),
        }
    }

    /// A context backed by a fresh [`MemorySessionStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// Read the persisted session once.
    ///
    /// A stored value that does not parse, or that has an empty token,
    /// leaves the context anonymous.
    pub fn restore(&self) -> Result<SessionState, CoreError> {
        let stored = self.read_stored()?;
        match stored {
            Some(session) if session.is_valid() => {
                self.set_current(Some(session));
                debug!("session restored from storage");
            }
            _ => self.set_current(None),
        }
        Ok(self.state())
    }

    /// Make `session` current and persist it when it differs from the
    /// stored one.
    pub fn login(&self, session: AuthSession) -> Result<(), CoreError> {
        let stored = self.read_stored()?;
        let unchanged = stored.as_ref().is_some_and(|s| s.same_token(&session));
        if !unchanged {
            let value = serde_json::to_string(&StoredSession::from(&session))
                .map_err(|e| storage_error("cannot encode session", e))?;
            self.inner.store.save(&value)?;
        }
        self.set_current(Some(session));
        info!("logged in");
        Ok(())
    }

    /// Drop the session from memory and storage.
    pub fn logout(&self) -> Result<(), CoreError> {
        self.set_current(None);
        self.inner.store.clear()?;
        info!("logged out");
        Ok(())
    }

    /// The in-memory session. Storage is never consulted here.
    pub fn current(&self) -> Option<Arc<AuthSession>> {
        self.inner.current.load_full()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state_tx.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        is_authenticated(self.current().as_deref())
    }

    /// Observe login / logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    fn set_current(&self, session: Option<AuthSession>) {
        let state = if is_authenticated(session.as_ref()) {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        self.inner.current.store(session.map(Arc::new));
        self.inner.state_tx.send_replace(state);
    }

    fn read_stored(&self) -> Result<Option<AuthSession>, CoreError> {
        let Some(raw) = self.inner.store.load()? else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Ok(Some(AuthSession::new(stored.token))),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable stored session");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn restore_reads_stored_token() {
        let store = Arc::new(MemorySessionStore::with_value(r#"{"token":"t1"}"#));
        let ctx = SessionContext::new(store);
        assert_eq!(ctx.state(), SessionState::Anonymous);

        assert_eq!(ctx.restore().unwrap(), SessionState::Authenticated);
        assert!(ctx.current().unwrap().same_token(&AuthSession::new("t1")));
    }

    #[test]
    fn restore_ignores_garbage_and_empty_tokens() {
        let ctx = SessionContext::new(Arc::new(MemorySessionStore::with_value("not json")));
        assert_eq!(ctx.restore().unwrap(), SessionState::Anonymous);

        let ctx = SessionContext::new(Arc::new(MemorySessionStore::with_value(r#"{"token":""}"#)));
        assert_eq!(ctx.restore().unwrap(), SessionState::Anonymous);
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn login_persists_and_logout_clears() {
        let store = Arc::new(MemorySessionStore::new());
        let ctx = SessionContext::new(store.clone());

        ctx.login(AuthSession::new("t2")).unwrap();
        assert!(ctx.is_authenticated());
        assert_eq!(store.load().unwrap().as_deref(), Some(r#"{"token":"t2"}"#));

        ctx.logout().unwrap();
        assert_eq!(ctx.state(), SessionState::Anonymous);
        assert!(ctx.current().is_none());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn current_does_not_reread_storage() {
        let store = Arc::new(MemorySessionStore::new());
        let ctx = SessionContext::new(store.clone());
        store.save(r#"{"token":"late"}"#).unwrap();
        assert!(ctx.current().is_none());
    }

    #[test]
    fn subscribers_see_transitions() {
        let ctx = SessionContext::in_memory();
        let rx = ctx.subscribe();
        ctx.login(AuthSession::new("t")).unwrap();
        assert_eq!(*rx.borrow(), SessionState::Authenticated);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::in_dir(&dir.path().join("nested"));
        assert!(store.load().unwrap().is_none());

        store.save(r#"{"token":"t1"}"#).unwrap();
        assert!(store.path().ends_with("auth-session.json"));
        assert_eq!(store.load().unwrap().as_deref(), Some(r#"{"token":"t1"}"#));

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
