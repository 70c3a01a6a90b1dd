//! Session store — login flag, creation time and per-platform connection flags
//! kept under a single key-value entry.
//!
//! Validation rules:
//! - Unparseable record → deleted, treated as logged out
//! - `now - created_at > ttl` → deleted, treated as logged out
//!
//! Neither case is an error to the caller; `load()` simply returns `None`.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::Duration;
use regex::Regex;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::config::{SessionConfig, StorageBackend};
use crate::models::{Connection, Platform, Session};
use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};

/// Storage key for the session record.
pub const SESSION_KEY: &str = "user";

/// Minimum accepted password length for the demo login.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("session ttl must be a positive number of hours, got {0}")]
    InvalidTtl(i64),

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    // held across every read-validate-discard and read-modify-write cycle
    lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            lock: Mutex::new(()),
        }
    }

    /// Build the store described by config, on the system clock.
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        let ttl = Duration::try_hours(config.ttl_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(SessionError::InvalidTtl(config.ttl_hours))?;
        let store: Arc<dyn KeyValueStore> = match config.storage {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => Arc::new(JsonFileStore::new(&config.storage_path)),
        };
        Ok(Self::new(store, Arc::new(SystemClock), ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read and validate the stored session. Invalid or expired records are
    /// removed and reported as `None`.
    pub fn load(&self) -> Option<Session> {
        let _guard = self.guard();
        self.load_locked()
    }

    fn load_locked(&self) -> Option<Session> {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(StorageError::Corrupt(e)) => {
                tracing::warn!("Session storage unreadable, clearing: {}", e);
                self.discard();
                return None;
            }
            Err(e) => {
                tracing::warn!("Session read failed, treating as logged out: {}", e);
                return None;
            }
        };

        let session: Session = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!("Discarding malformed session record: {}", e);
                self.discard();
                return None;
            }
        };

        if session.is_expired(self.clock.now(), self.ttl) {
            tracing::info!("Session {} expired, clearing", session.id);
            self.discard();
            return None;
        }

        Some(session)
    }

    /// Overwrite the stored record.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let _guard = self.guard();
        self.save_locked(session)
    }

    fn save_locked(&self, session: &Session) -> Result<(), SessionError> {
        let raw = serde_json::to_string(session)?;
        self.store.set(SESSION_KEY, &raw)?;
        Ok(())
    }

    /// Flip one platform's connection flag and persist.
    pub fn set_connection(
        &self,
        platform: Platform,
        connected: bool,
    ) -> Result<Session, SessionError> {
        let _guard = self.guard();
        let mut session = match self.load_locked() {
            Some(s) if s.logged_in => s,
            _ => return Err(SessionError::NotLoggedIn),
        };

        let last_sync = if connected { Some(self.clock.now()) } else { None };
        session.connections.insert(
            platform,
            Connection {
                connected,
                last_sync,
            },
        );
        self.save_locked(&session)?;

        tracing::info!(
            "{} {}",
            platform,
            if connected { "connected" } else { "disconnected" }
        );
        Ok(session)
    }

    /// Demo login: validates the form and starts a fresh session with the
    /// chosen platform already connected.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        platform: Platform,
    ) -> Result<Session, SessionError> {
        validate_credentials(email, password)?;

        let _guard = self.guard();
        let now = self.clock.now();
        let mut session = Session::new(now);
        session.email = Some(email.trim().to_string());
        session.connections.insert(
            platform,
            Connection {
                connected: true,
                last_sync: Some(now),
            },
        );
        self.save_locked(&session)?;

        tracing::info!("Logged in to {} (session {})", platform, session.id);
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        let _guard = self.guard();
        self.store.remove(SESSION_KEY)?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Platforms whose prices the current caller may see mutate. Empty when
    /// logged out.
    pub fn connected_platforms(&self) -> BTreeSet<Platform> {
        match self.load() {
            Some(s) if s.logged_in => s.connected_platforms(),
            _ => BTreeSet::new(),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Caller holds the lock.
    fn discard(&self) {
        if let Err(e) = self.store.remove(SESSION_KEY) {
            tracing::warn!("Failed to remove stale session: {}", e);
        }
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), SessionError> {
    if !email_pattern().is_match(email.trim()) {
        return Err(SessionError::InvalidCredentials(
            "Please enter a valid email address".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SessionError::InvalidCredentials(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn fixture() -> (SessionStore, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let kv = Arc::new(MemoryStore::new());
        let store = SessionStore::new(kv.clone(), clock.clone(), Duration::hours(24));
        (store, clock, kv)
    }

    #[test]
    fn test_load_empty_is_none() {
        let (store, _, _) = fixture();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load_roundtrips() {
        let (store, clock, _) = fixture();
        let session = Session::new(clock.now());
        store.save(&session).unwrap();
        assert_eq!(store.load(), Some(session));
    }

    #[test]
    fn test_expired_session_is_deleted() {
        let (store, clock, kv) = fixture();
        store.save(&Session::new(clock.now())).unwrap();

        clock.advance(Duration::hours(24) + Duration::seconds(1));

        assert!(store.load().is_none());
        assert_eq!(kv.get(SESSION_KEY).unwrap(), None, "record must be removed");
    }

    #[test]
    fn test_session_exactly_at_ttl_is_still_valid() {
        let (store, clock, _) = fixture();
        store.save(&Session::new(clock.now())).unwrap();
        clock.advance(Duration::hours(24));
        assert!(store.load().is_some());
    }

    #[test]
    fn test_malformed_record_is_deleted() {
        let (store, _, kv) = fixture();
        kv.set(SESSION_KEY, "{not json").unwrap();

        assert!(store.load().is_none());
        assert_eq!(kv.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_login_connects_chosen_platform() {
        let (store, clock, _) = fixture();
        let session = store
            .login("diner@example.com", "secret1", Platform::Zomato)
            .unwrap();

        assert!(session.logged_in);
        assert_eq!(session.email.as_deref(), Some("diner@example.com"));
        assert!(session.is_connected(Platform::Zomato));
        assert!(!session.is_connected(Platform::Swiggy));
        assert_eq!(
            session.connections[&Platform::Zomato].last_sync,
            Some(clock.now())
        );
        assert_eq!(store.load(), Some(session));
    }

    #[test]
    fn test_login_rejects_bad_email() {
        let (store, _, _) = fixture();
        let err = store
            .login("not-an-email", "secret1", Platform::Swiggy)
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials(_)));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_login_rejects_short_password() {
        let (store, _, _) = fixture();
        let err = store
            .login("diner@example.com", "12345", Platform::Swiggy)
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials(_)));
    }

    #[test]
    fn test_set_connection_requires_login() {
        let (store, _, _) = fixture();
        let err = store.set_connection(Platform::Swiggy, true).unwrap_err();
        assert!(matches!(err, SessionError::NotLoggedIn));
    }

    #[test]
    fn test_set_connection_stamps_and_clears_last_sync() {
        let (store, clock, _) = fixture();
        store
            .login("diner@example.com", "secret1", Platform::Swiggy)
            .unwrap();

        clock.advance(Duration::minutes(5));
        let session = store.set_connection(Platform::UberEats, true).unwrap();
        assert_eq!(
            session.connections[&Platform::UberEats].last_sync,
            Some(clock.now())
        );

        let session = store.set_connection(Platform::Swiggy, false).unwrap();
        assert!(!session.is_connected(Platform::Swiggy));
        assert_eq!(session.connections[&Platform::Swiggy].last_sync, None);

        let connected = store.connected_platforms();
        assert_eq!(connected.into_iter().collect::<Vec<_>>(), vec![Platform::UberEats]);
    }

    #[test]
    fn test_logout_clears_record() {
        let (store, _, _) = fixture();
        store
            .login("diner@example.com", "secret1", Platform::Swiggy)
            .unwrap();
        store.logout().unwrap();
        assert!(store.load().is_none());
        assert!(store.connected_platforms().is_empty());
    }

    #[test]
    fn test_logged_out_record_has_no_connected_platforms() {
        let (store, clock, _) = fixture();
        let mut session = Session::new(clock.now());
        session.logged_in = false;
        session.connections.insert(
            Platform::Swiggy,
            Connection {
                connected: true,
                last_sync: None,
            },
        );
        store.save(&session).unwrap();

        assert!(store.connected_platforms().is_empty());
    }

    #[test]
    fn test_file_backend_recovers_from_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let kv = Arc::new(JsonFileStore::new(&path));
        let store = SessionStore::new(kv.clone(), clock, Duration::hours(24));

        assert!(store.load().is_none());
        assert_eq!(kv.get(SESSION_KEY).unwrap(), None, "corrupt file must be cleared");

        let session = store
            .login("diner@example.com", "secret1", Platform::Swiggy)
            .unwrap();
        store.set_connection(Platform::Zomato, true).unwrap();

        let reopened = SessionStore::new(
            Arc::new(JsonFileStore::new(&path)),
            Arc::new(ManualClock::new(session.created_at)),
            Duration::hours(24),
        );
        let loaded = reopened.load().unwrap();
        assert_eq!(loaded.id, session.id);
        assert!(loaded.is_connected(Platform::Zomato));

        reopened.logout().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_from_config_rejects_bad_ttl() {
        let mut config = SessionConfig::default();
        assert_eq!(SessionStore::from_config(&config).unwrap().ttl(), Duration::hours(24));

        for hours in [0, -3, i64::MAX] {
            config.ttl_hours = hours;
            assert!(matches!(
                SessionStore::from_config(&config),
                Err(SessionError::InvalidTtl(h)) if h == hours
            ));
        }
    }

    /// Store whose first `get` reports in and then stalls, so another caller
    /// can race it.
    struct StallingStore {
        inner: MemoryStore,
        first_read: Mutex<Option<std::sync::mpsc::Sender<()>>>,
    }

    impl KeyValueStore for StallingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            let value = self.inner.get(key)?;
            if let Some(tx) = self.first_read.lock().unwrap().take() {
                tx.send(()).unwrap();
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
            Ok(value)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_expiry_cleanup_does_not_clobber_new_login() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let (tx, rx) = std::sync::mpsc::channel();
        let kv = Arc::new(StallingStore {
            inner: MemoryStore::new(),
            first_read: Mutex::new(None),
        });
        let store = Arc::new(SessionStore::new(kv.clone(), clock.clone(), Duration::hours(24)));

        store.save(&Session::new(clock.now())).unwrap();
        clock.advance(Duration::hours(25));
        *kv.first_read.lock().unwrap() = Some(tx);

        let reader = {
            let store = store.clone();
            std::thread::spawn(move || store.load())
        };
        rx.recv().unwrap();
        let fresh = store
            .login("diner@example.com", "secret1", Platform::UberEats)
            .unwrap();

        assert!(reader.join().unwrap().is_none());
        assert_eq!(store.load(), Some(fresh));
    }
}
