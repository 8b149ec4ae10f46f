use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::User;

use super::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A persisted session was validated against the server.
    Restored(User),
    /// No usable persisted session; the caller should show the login
    /// surface.
    Unauthenticated,
}

/// Startup sequence: validate any persisted tokens against the server
/// before the rest of the app renders protected content.
pub struct Bootstrapper {
    store: Arc<SessionStore>,
}

impl Bootstrapper {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Run the bootstrap. Exactly one network call (`/auth/me`) when a
    /// token is present, zero when there is none. The session leaves the
    /// bootstrapping state in every path.
    pub async fn run(&self, client: &ApiClient) -> BootstrapOutcome {
        if self.store.access_token().is_none() {
            debug!("No persisted access token, skipping session restore");
            self.store.set_bootstrapping(false);
            return BootstrapOutcome::Unauthenticated;
        }

        match client.me().await {
            Ok(user) => {
                // Re-read the tokens: the me() call itself may have
                // rotated the access token through the refresh path.
                let access = self.store.access_token();
                let refresh = self.store.refresh_token();
                match (access, refresh) {
                    (Some(access), Some(refresh)) => {
                        self.store.set_auth(user.clone(), access, refresh);
                        info!(email = %user.email, "Restored persisted session");
                        BootstrapOutcome::Restored(user)
                    }
                    _ => {
                        warn!("Session tokens vanished during restore");
                        self.store.clear();
                        BootstrapOutcome::Unauthenticated
                    }
                }
            }
            Err(e) => {
                debug!("Persisted session rejected: {e}");
                self.store.clear();
                BootstrapOutcome::Unauthenticated
            }
        }
    }
}
