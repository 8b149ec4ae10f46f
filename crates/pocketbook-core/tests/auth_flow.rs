//! End-to-end tests for the session lifecycle: login, bearer
//! attachment, coalesced refresh-and-retry, and startup restore. The
//! wire is replaced by a scripted in-memory transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::json;

use pocketbook_core::api::{ApiClient, ApiError, ApiRequest, ApiResponse, Transport};
use pocketbook_core::auth::{BootstrapOutcome, Bootstrapper, SessionStore, TokenStorage};
use pocketbook_core::models::{ExpenseFilters, LoginRequest, Role, User};

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync;

/// Transport whose behavior is a closure over the incoming request.
/// Records every request and optionally delays refresh calls to widen
/// the race window in concurrency tests.
struct ScriptedTransport {
    log: Mutex<Vec<ApiRequest>>,
    handler: Box<Handler>,
    refresh_delay: Duration,
}

impl ScriptedTransport {
    fn new(handler: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            handler: Box::new(handler),
            refresh_delay: Duration::ZERO,
        })
    }

    fn with_refresh_delay(
        delay: Duration,
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            handler: Box::new(handler),
            refresh_delay: delay,
        })
    }

    fn requests_to(&self, path: &str) -> usize {
        self.log.lock().iter().filter(|r| r.path == path).count()
    }

    fn paths(&self) -> Vec<String> {
        self.log.lock().iter().map(|r| r.path.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.log.lock().push(request.clone());
        if request.path == "/auth/refresh" && !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        (self.handler)(&request)
    }
}

fn ok(body: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse {
        status: StatusCode::OK,
        body: body.to_string(),
    })
}

fn status(code: StatusCode, body: &str) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse {
        status: code,
        body: body.to_string(),
    })
}

fn user_json() -> serde_json::Value {
    json!({
        "id": "u-1",
        "name": "Ada",
        "email": "ada@example.com",
        "role": "USER"
    })
}

fn expected_user() -> User {
    User {
        id: "u-1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::User,
    }
}

fn expense_page_json() -> serde_json::Value {
    json!({
        "content": [],
        "totalPages": 0,
        "totalElements": 0,
        "number": 0,
        "size": 20,
        "first": true,
        "last": true,
        "empty": true
    })
}

fn fresh_store(dir: &tempfile::TempDir) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(TokenStorage::new(dir.path().to_path_buf())))
}

fn authenticated_store(dir: &tempfile::TempDir, access: &str, refresh: &str) -> Arc<SessionStore> {
    let store = fresh_store(dir);
    store.set_auth(expected_user(), access.to_string(), refresh.to_string());
    store
}

// ============================================================================
// Bearer attachment
// ============================================================================

#[tokio::test]
async fn attaches_bearer_token_to_requests() {
    let dir = tempfile::tempdir().unwrap();
    let store = authenticated_store(&dir, "acc-1", "ref-1");

    let transport = ScriptedTransport::new(|req| {
        assert_eq!(req.bearer.as_deref(), Some("acc-1"));
        ok(json!([]))
    });
    let client = ApiClient::new(transport.clone(), store);

    client.categories(None).await.unwrap();
    assert_eq!(transport.requests_to("/categories"), 1);
}

#[tokio::test]
async fn sends_no_bearer_when_session_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = fresh_store(&dir);

    let transport = ScriptedTransport::new(|req| match req.path.as_str() {
        "/auth/login" => {
            assert!(req.bearer.is_none());
            ok(json!({ "token": "acc", "refreshToken": "ref" }))
        }
        "/auth/me" => ok(user_json()),
        other => panic!("unexpected request to {other}"),
    });
    let client = ApiClient::new(transport, store);

    client
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_establishes_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = fresh_store(&dir);
    store.set_bootstrapping(false);

    let transport = ScriptedTransport::new(|req| match req.path.as_str() {
        "/auth/login" => ok(json!({ "token": "acc-1", "refreshToken": "ref-1" })),
        "/auth/me" => {
            assert_eq!(req.bearer.as_deref(), Some("acc-1"));
            ok(user_json())
        }
        other => panic!("unexpected request to {other}"),
    });
    let client = ApiClient::new(transport.clone(), store.clone());

    let user = client
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user, expected_user());
    assert!(store.is_authenticated());
    assert_eq!(store.access_token().as_deref(), Some("acc-1"));
    assert_eq!(store.refresh_token().as_deref(), Some("ref-1"));
    assert_eq!(transport.paths(), vec!["/auth/login", "/auth/me"]);
}

#[tokio::test]
async fn failed_login_leaves_session_unauthenticated() {
    let dir = tempfile::tempdir().unwrap();
    let store = fresh_store(&dir);
    store.set_bootstrapping(false);

    let transport = ScriptedTransport::new(|_| {
        status(StatusCode::UNAUTHORIZED, r#"{"message":"bad credentials"}"#)
    });
    let client = ApiClient::new(transport, store.clone());

    let result = client
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert!(!store.is_authenticated());
}

// ============================================================================
// 401 refresh-and-retry
// ============================================================================

#[tokio::test]
async fn refreshes_and_retries_once_on_401() {
    let dir = tempfile::tempdir().unwrap();
    let store = authenticated_store(&dir, "stale", "ref-1");

    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = refreshes.clone();
    let transport = ScriptedTransport::new(move |req| match req.path.as_str() {
        "/expenses" => match req.bearer.as_deref() {
            Some("fresh") => ok(expense_page_json()),
            _ => status(StatusCode::UNAUTHORIZED, ""),
        },
        "/auth/refresh" => {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(
                req.body.as_ref().and_then(|b| b.get("refreshToken")),
                Some(&json!("ref-1"))
            );
            ok(json!({ "token": "fresh", "refreshToken": "ref-1" }))
        }
        other => panic!("unexpected request to {other}"),
    });
    let client = ApiClient::new(transport.clone(), store.clone());

    let page = client.expenses(&ExpenseFilters::default()).await.unwrap();
    assert!(page.empty);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(store.access_token().as_deref(), Some("fresh"));
    assert!(store.is_authenticated());
    assert_eq!(transport.requests_to("/expenses"), 2);
}

#[tokio::test]
async fn concurrent_401s_coalesce_into_one_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = authenticated_store(&dir, "stale", "ref-1");

    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = refreshes.clone();
    let transport = ScriptedTransport::with_refresh_delay(
        Duration::from_millis(50),
        move |req| match req.path.as_str() {
            "/expenses" => match req.bearer.as_deref() {
                Some("fresh") => ok(expense_page_json()),
                _ => status(StatusCode::UNAUTHORIZED, ""),
            },
            "/auth/refresh" => {
                counter.fetch_add(1, Ordering::SeqCst);
                ok(json!({ "token": "fresh", "refreshToken": "ref-1" }))
            }
            other => panic!("unexpected request to {other}"),
        },
    );
    let client = Arc::new(ApiClient::new(transport.clone(), store.clone()));

    let results = futures::future::join_all((0..3).map(|_| {
        let client = Arc::clone(&client);
        async move { client.expenses(&ExpenseFilters::default()).await }
    }))
    .await;

    for result in results {
        assert!(result.is_ok());
    }
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(store.access_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn concurrent_401s_with_failing_refresh_all_expire() {
    let dir = tempfile::tempdir().unwrap();
    let store = authenticated_store(&dir, "stale", "revoked");

    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = refreshes.clone();
    let transport = ScriptedTransport::with_refresh_delay(
        Duration::from_millis(50),
        move |req| match req.path.as_str() {
            "/expenses" => status(StatusCode::UNAUTHORIZED, ""),
            "/auth/refresh" => {
                counter.fetch_add(1, Ordering::SeqCst);
                status(StatusCode::UNAUTHORIZED, r#"{"message":"revoked"}"#)
            }
            other => panic!("unexpected request to {other}"),
        },
    );
    let client = Arc::new(ApiClient::new(transport, store.clone()));

    let results = futures::future::join_all((0..3).map(|_| {
        let client = Arc::clone(&client);
        async move { client.expenses(&ExpenseFilters::default()).await }
    }))
    .await;

    for result in results {
        assert!(matches!(result, Err(ApiError::SessionExpired)));
    }
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn failed_refresh_clears_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = authenticated_store(&dir, "stale", "ref-1");

    let transport = ScriptedTransport::new(|req| match req.path.as_str() {
        "/expenses" => status(StatusCode::UNAUTHORIZED, ""),
        "/auth/refresh" => status(StatusCode::UNAUTHORIZED, r#"{"message":"revoked"}"#),
        other => panic!("unexpected request to {other}"),
    });
    let client = ApiClient::new(transport, store.clone());

    let result = client.expenses(&ExpenseFilters::default()).await;
    assert!(matches!(result, Err(ApiError::SessionExpired)));

    let session = store.snapshot();
    assert!(!session.authenticated);
    assert!(session.access_token.is_none());
    assert!(session.refresh_token.is_none());
}

#[tokio::test]
async fn second_401_after_refresh_does_not_loop() {
    let dir = tempfile::tempdir().unwrap();
    let store = authenticated_store(&dir, "stale", "ref-1");

    let transport = ScriptedTransport::new(|req| match req.path.as_str() {
        "/expenses" => status(StatusCode::UNAUTHORIZED, ""),
        "/auth/refresh" => ok(json!({ "token": "fresh", "refreshToken": "ref-1" })),
        other => panic!("unexpected request to {other}"),
    });
    let client = ApiClient::new(transport.clone(), store);

    let result = client.expenses(&ExpenseFilters::default()).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(transport.requests_to("/expenses"), 2);
    assert_eq!(transport.requests_to("/auth/refresh"), 1);
}

#[tokio::test]
async fn missing_refresh_token_passes_401_through() {
    let dir = tempfile::tempdir().unwrap();
    let storage = TokenStorage::new(dir.path().to_path_buf());
    storage.store_access("acc-only").unwrap();
    let store = Arc::new(SessionStore::new(storage));

    let transport = ScriptedTransport::new(|_| status(StatusCode::UNAUTHORIZED, ""));
    let client = ApiClient::new(transport.clone(), store.clone());

    let result = client.expenses(&ExpenseFilters::default()).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    // No refresh attempt was made and the stored token is untouched.
    assert_eq!(transport.requests_to("/auth/refresh"), 0);
    assert_eq!(store.access_token().as_deref(), Some("acc-only"));
}

#[tokio::test]
async fn rotated_access_token_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = authenticated_store(&dir, "stale", "ref-1");
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/expenses" => match req.bearer.as_deref() {
                Some("fresh") => ok(expense_page_json()),
                _ => status(StatusCode::UNAUTHORIZED, ""),
            },
            "/auth/refresh" => ok(json!({ "token": "fresh", "refreshToken": "ref-1" })),
            other => panic!("unexpected request to {other}"),
        });
        let client = ApiClient::new(transport, store);
        client.expenses(&ExpenseFilters::default()).await.unwrap();
    }

    // A new process sees the rotated access token and the original
    // refresh token.
    let store = fresh_store(&dir);
    assert_eq!(store.access_token().as_deref(), Some("fresh"));
    assert_eq!(store.refresh_token().as_deref(), Some("ref-1"));
}

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn bootstrap_restores_persisted_session() {
    let dir = tempfile::tempdir().unwrap();
    {
        authenticated_store(&dir, "acc-1", "ref-1");
    }
    let store = fresh_store(&dir);
    assert!(store.snapshot().bootstrapping);

    let transport = ScriptedTransport::new(|req| {
        assert_eq!(req.path, "/auth/me");
        assert_eq!(req.bearer.as_deref(), Some("acc-1"));
        ok(user_json())
    });
    let client = ApiClient::new(transport.clone(), store.clone());

    let outcome = Bootstrapper::new(store.clone()).run(&client).await;
    assert_eq!(outcome, BootstrapOutcome::Restored(expected_user()));

    let session = store.snapshot();
    assert!(session.authenticated);
    assert!(!session.bootstrapping);
    assert_eq!(transport.requests_to("/auth/me"), 1);
}

#[tokio::test]
async fn bootstrap_refreshes_stale_access_token() {
    let dir = tempfile::tempdir().unwrap();
    {
        authenticated_store(&dir, "stale", "ref-1");
    }
    let store = fresh_store(&dir);

    let transport = ScriptedTransport::new(|req| match req.path.as_str() {
        "/auth/me" => match req.bearer.as_deref() {
            Some("fresh") => ok(user_json()),
            _ => status(StatusCode::UNAUTHORIZED, ""),
        },
        "/auth/refresh" => ok(json!({ "token": "fresh", "refreshToken": "ref-1" })),
        other => panic!("unexpected request to {other}"),
    });
    let client = ApiClient::new(transport.clone(), store.clone());

    let outcome = Bootstrapper::new(store.clone()).run(&client).await;
    assert_eq!(outcome, BootstrapOutcome::Restored(expected_user()));
    assert_eq!(store.access_token().as_deref(), Some("fresh"));
    assert_eq!(transport.requests_to("/auth/refresh"), 1);
}

#[tokio::test]
async fn bootstrap_without_tokens_makes_no_network_calls() {
    let dir = tempfile::tempdir().unwrap();
    let store = fresh_store(&dir);

    let transport = ScriptedTransport::new(|req| {
        panic!("unexpected request to {}", req.path);
    });
    let client = ApiClient::new(transport.clone(), store.clone());

    let outcome = Bootstrapper::new(store.clone()).run(&client).await;
    assert_eq!(outcome, BootstrapOutcome::Unauthenticated);

    let session = store.snapshot();
    assert!(!session.bootstrapping);
    assert!(!session.authenticated);
    assert!(transport.paths().is_empty());
}

#[tokio::test]
async fn bootstrap_with_rejected_tokens_clears_session() {
    let dir = tempfile::tempdir().unwrap();
    {
        authenticated_store(&dir, "stale", "revoked");
    }
    let store = fresh_store(&dir);

    let transport = ScriptedTransport::new(|req| match req.path.as_str() {
        "/auth/me" => status(StatusCode::UNAUTHORIZED, ""),
        "/auth/refresh" => status(StatusCode::UNAUTHORIZED, r#"{"message":"revoked"}"#),
        other => panic!("unexpected request to {other}"),
    });
    let client = ApiClient::new(transport, store.clone());

    let outcome = Bootstrapper::new(store.clone()).run(&client).await;
    assert_eq!(outcome, BootstrapOutcome::Unauthenticated);

    let session = store.snapshot();
    assert!(!session.authenticated);
    assert!(!session.bootstrapping);
    assert!(session.access_token.is_none());

    // The cleared session is durable.
    let reopened = fresh_store(&dir);
    assert!(reopened.access_token().is_none());
    assert!(reopened.refresh_token().is_none());
}
