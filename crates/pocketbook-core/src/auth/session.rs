use parking_lot::RwLock;
use tracing::warn;

use crate::models::User;

use super::storage::TokenStorage;

/// In-memory session state. `authenticated` is derived: it is true only
/// while both an access token and a user profile are present.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub authenticated: bool,
    pub bootstrapping: bool,
}

/// Shared session store. Mutations persist tokens to durable storage
/// before updating the in-memory state, so a crash between the two
/// leaves the disk ahead of memory rather than behind it.
pub struct SessionStore {
    storage: TokenStorage,
    state: RwLock<Session>,
}

impl SessionStore {
    /// Create a store seeded from durable storage. Seeded tokens alone
    /// never mark the session authenticated; the bootstrap sequence must
    /// confirm them against the server first.
    pub fn new(storage: TokenStorage) -> Self {
        let tokens = match storage.load() {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Failed to load persisted tokens: {e:#}");
                Default::default()
            }
        };

        let state = Session {
            user: None,
            access_token: tokens.access,
            refresh_token: tokens.refresh,
            authenticated: false,
            bootstrapping: true,
        };

        Self {
            storage,
            state: RwLock::new(state),
        }
    }

    /// Establish a fully authenticated session.
    pub fn set_auth(&self, user: User, access_token: String, refresh_token: String) {
        if let Err(e) = self.storage.store(&access_token, &refresh_token) {
            warn!("Failed to persist tokens: {e:#}");
        }
        let mut state = self.state.write();
        state.user = Some(user);
        state.access_token = Some(access_token);
        state.refresh_token = Some(refresh_token);
        state.authenticated = true;
        state.bootstrapping = false;
    }

    /// Replace the access token, e.g. after a refresh. The refresh token
    /// on disk is left untouched.
    pub fn set_access_token(&self, access_token: String) {
        if let Err(e) = self.storage.store_access(&access_token) {
            warn!("Failed to persist access token: {e:#}");
        }
        let mut state = self.state.write();
        state.access_token = Some(access_token);
        state.authenticated = state.user.is_some();
    }

    /// Update the user profile, e.g. after a profile edit.
    pub fn set_user(&self, user: User) {
        let mut state = self.state.write();
        state.user = Some(user);
        state.authenticated = state.access_token.is_some();
    }

    /// Drop the session entirely, in memory and on disk.
    pub fn clear(&self) {
        if let Err(e) = self.storage.clear() {
            warn!("Failed to clear persisted tokens: {e:#}");
        }
        let mut state = self.state.write();
        *state = Session::default();
    }

    pub fn set_bootstrapping(&self, bootstrapping: bool) {
        self.state.write().bootstrapping = bootstrapping;
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.read().user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn test_user() -> User {
        User {
            id: "u-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::User,
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(TokenStorage::new(dir.path().to_path_buf()))
    }

    #[test]
    fn fresh_store_is_unauthenticated_and_bootstrapping() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let session = store.snapshot();
        assert!(!session.authenticated);
        assert!(session.bootstrapping);
        assert!(session.access_token.is_none());
    }

    #[test]
    fn seeded_tokens_do_not_authenticate() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = store_in(&dir);
            store.set_auth(test_user(), "acc".to_string(), "ref".to_string());
        }
        // Second store sees the persisted tokens but no confirmed user.
        let store = store_in(&dir);
        let session = store.snapshot();
        assert_eq!(session.access_token.as_deref(), Some("acc"));
        assert_eq!(session.refresh_token.as_deref(), Some("ref"));
        assert!(!session.authenticated);
        assert!(session.bootstrapping);
    }

    #[test]
    fn set_auth_authenticates_and_ends_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_auth(test_user(), "acc".to_string(), "ref".to_string());

        let session = store.snapshot();
        assert!(session.authenticated);
        assert!(!session.bootstrapping);
        assert_eq!(session.user.as_ref().map(|u| u.email.as_str()),
                   Some("ada@example.com"));
    }

    #[test]
    fn access_token_alone_is_not_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_access_token("acc".to_string());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn token_rotation_keeps_authentication() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_auth(test_user(), "acc-1".to_string(), "ref".to_string());
        store.set_access_token("acc-2".to_string());

        assert!(store.is_authenticated());
        assert_eq!(store.access_token().as_deref(), Some("acc-2"));
        assert_eq!(store.refresh_token().as_deref(), Some("ref"));
    }

    #[test]
    fn clear_resets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_auth(test_user(), "acc".to_string(), "ref".to_string());
        store.clear();

        let session = store.snapshot();
        assert!(!session.authenticated);
        assert!(!session.bootstrapping);
        assert!(session.user.is_none());
        assert!(session.access_token.is_none());
        assert!(session.refresh_token.is_none());
    }
}
