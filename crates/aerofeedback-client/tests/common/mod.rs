//! Shared fixtures for client integration tests

#![allow(dead_code)]

use aerofeedback_client::{AdminService, ApiClient, AuthService, MemoryTokenStore, RetryPolicy};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token every authenticated fixture starts with
pub const TEST_TOKEN: &str = "test-session-token";

/// Health endpoint probed before deletion approval
pub const HEALTH_PATH: &str = "/api/health";

static INIT: Once = Once::new();

/// Install a test subscriber once per binary
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("aerofeedback_client=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Retry policy scaled down so retry tests finish quickly
pub const fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(250))
}

/// A mock backend with clients pointed at it
pub struct TestBackend {
    pub server: MockServer,
    pub tokens: Arc<MemoryTokenStore>,
}

impl TestBackend {
    /// Start a mock backend; the token store already holds [`TEST_TOKEN`]
    pub async fn start() -> Self {
        init_test_logging();
        Self {
            server: MockServer::start().await,
            tokens: Arc::new(MemoryTokenStore::with_token(TEST_TOKEN)),
        }
    }

    /// Start a mock backend with nobody logged in
    pub async fn start_logged_out() -> Self {
        init_test_logging();
        Self {
            server: MockServer::start().await,
            tokens: Arc::new(MemoryTokenStore::new()),
        }
    }

    /// Low-level client for this backend
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.server.uri(), self.tokens.clone()).expect("client builds")
    }

    /// Admin façade using the fast retry policy
    pub fn admin(&self) -> AdminService {
        AdminService::new(self.client()).with_retry_policy(fast_policy())
    }

    /// Auth service for this backend
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.client())
    }

    /// Answer health probes with 200
    pub async fn healthy(&self) {
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the backend saw for `request_path`
    pub async fn hits(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }
}

/// A deletion request as the backend returns it
pub fn deletion_request_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "form_id": 42,
        "reason": "Course retired",
        "status": status,
        "requested_by": 7,
        "created_at": "2024-05-01T09:30:00Z"
    })
}

/// A published form with one rating and one text question
pub fn form_json(id: i64) -> Value {
    json!({
        "id": id,
        "title": "A320 simulator debrief",
        "description": "Type rating, session 4",
        "department_id": 2,
        "trainer_id": 5,
        "due_date": "2024-06-30",
        "status": "published",
        "form_data": {
            "questions": [
                {"id": "q1", "text": "How clear was the briefing?", "type": "rating"},
                {"id": "q2", "text": "Comments", "type": "text"}
            ],
            "settings": {},
            "session": {"aircraft": "A320"}
        },
        "created_at": "2024-06-01T08:00:00Z"
    })
}

/// A user as the backend returns it
pub fn user_json(role: &str) -> Value {
    json!({
        "id": 3,
        "email": "instructor@example.com",
        "name": "Captain Reyes",
        "role": role,
        "department_id": null
    })
}
