use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};

use super::session::SessionStore;

/// Refresh endpoint path. Requests to it never trigger recovery, which
/// rules out refresh-on-refresh recursion.
const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
}

/// Sends requests with the current access token attached and performs a
/// single refresh-and-retry when the server answers 401.
///
/// Concurrent 401s coalesce: the first caller through `refresh_lock`
/// performs the refresh, later callers observe the rotated token under
/// the lock and retry without another refresh call.
pub struct AuthPipeline {
    transport: Arc<dyn Transport>,
    store: Arc<SessionStore>,
    refresh_lock: Mutex<()>,
}

impl AuthPipeline {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<SessionStore>) -> Self {
        Self {
            transport,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Send a request through the pipeline. On 401 the pipeline refreshes
    /// the access token and retries exactly once; a second 401 surfaces
    /// as [`ApiError::Unauthorized`].
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let sent_token = self.store.access_token();
        request.bearer = sent_token.clone();

        let retry_template = request.clone();
        let response = self.transport.call(request).await?;

        if response.status != StatusCode::UNAUTHORIZED || retry_template.path == REFRESH_PATH {
            return Self::check(response);
        }

        debug!(path = %retry_template.path, "Got 401, attempting token refresh");
        let fresh_token = self.recover(sent_token).await?;

        let mut retry = retry_template;
        retry.bearer = Some(fresh_token);
        let response = self.transport.call(retry).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            // Refreshed token was rejected too; do not loop.
            return Err(ApiError::Unauthorized);
        }
        Self::check(response)
    }

    /// Obtain a token to retry with after a 401. Exactly one refresh
    /// request is made per expiry episode regardless of how many callers
    /// arrive here concurrently.
    async fn recover(&self, sent_token: Option<String>) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.store.access_token();
        if current != sent_token {
            // Another caller already resolved this episode while we
            // waited on the lock.
            return match current {
                Some(token) => Ok(token),
                None => Err(ApiError::SessionExpired),
            };
        }

        let Some(refresh_token) = self.store.refresh_token() else {
            // Nothing to refresh with; surface the original 401 and
            // leave the session untouched.
            return Err(ApiError::Unauthorized);
        };

        // Run the refresh in its own task so the store update survives
        // even if the caller that triggered it is cancelled mid-await.
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            match Self::execute_refresh(&*transport, &refresh_token).await {
                Ok(token) => {
                    info!("Access token refreshed");
                    store.set_access_token(token.clone());
                    Ok(token)
                }
                Err(e) => {
                    warn!("Token refresh failed: {e}");
                    store.clear();
                    Err(e)
                }
            }
        });

        match handle.await {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(_)) => Err(ApiError::SessionExpired),
            Err(e) => Err(ApiError::InvalidResponse(format!(
                "Refresh task failed: {}",
                e
            ))),
        }
    }

    async fn execute_refresh(
        transport: &dyn Transport,
        refresh_token: &str,
    ) -> Result<String, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .with_body(serde_json::json!({ "refreshToken": refresh_token }));
        let response = transport.call(request).await?;
        let response = Self::check(response)?;
        let parsed: RefreshResponse = response.json()?;
        Ok(parsed.token)
    }

    fn check(response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }
}
