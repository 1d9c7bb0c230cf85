//! Test application setup utilities
//!
//! Provides utilities for setting up test instances of the application
//! backed by a throwaway SQLite database.

use axum::{body::Body, http::Request, Router};
use tower::ServiceExt;
use uuid::Uuid;

use audit_service::{
    api,
    config::{AppConfig, AuditConfig, AuthConfig, DatabaseConfig, LoggingConfig, ServerConfig},
    db::{self, AuditRepository, AuditStore},
    models::{AuditRecord, NewAuditRecord},
    AppState,
};

/// API key configured for every test application
pub const TEST_API_KEY: &str = "1234abcd";

/// Host header sent by the request helpers
pub const TEST_HOST: &str = "localhost:3000";

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with a fresh database
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test application that validates but does not store records
    pub async fn without_persistence() -> Self {
        let mut config = test_config();
        config.audit.persist_enabled = false;
        Self::with_config(config).await
    }

    /// Create a new test application with custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");

        let state = AppState { config, db };
        let router = api::router(state.clone());

        Self { router, state }
    }

    /// Insert records directly through the repository
    pub async fn seed(&self, records: &[NewAuditRecord]) -> Vec<AuditRecord> {
        let repo = AuditRepository::new(&self.state.db);
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            created.push(repo.insert(record).await.expect("Failed to seed record"));
        }
        created
    }

    /// Number of stored records
    pub async fn stored_count(&self) -> i64 {
        AuditRepository::new(&self.state.db)
            .count()
            .await
            .expect("Failed to count records")
    }

    /// Make a GET request carrying the test API key
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.get_with_key(uri, Some(TEST_API_KEY)).await
    }

    /// Make a GET request with an optional API key
    pub async fn get_with_key(&self, uri: &str, api_key: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("GET")
            .uri(uri)
            .header("host", TEST_HOST);
        if let Some(key) = api_key {
            builder = builder.header("x-api-key", key);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Make a GET request with a JSON body (field selection)
    pub async fn get_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("host", TEST_HOST)
                .header("x-api-key", TEST_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body carrying the test API key
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.post_json_with_key(uri, body, Some(TEST_API_KEY)).await
    }

    /// Make a POST request with JSON body and an optional API key
    pub async fn post_json_with_key(
        &self,
        uri: &str,
        body: serde_json::Value,
        api_key: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("host", TEST_HOST)
            .header("Content-Type", "application/json");
        if let Some(key) = api_key {
            builder = builder.header("x-api-key", key);
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NOT_FOUND)
    }

    /// Assert the response status is Internal Server Error (500)
    pub fn assert_server_error(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Create a test configuration with temporary SQLite database
pub fn test_config() -> AppConfig {
    // Use a unique temp file for each test to avoid conflicts
    let db_path = format!(
        "/tmp/audit_test_{}.db",
        Uuid::new_v4().to_string().replace('-', "")
    );

    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            tls: None,
            trust_proxy: false,
        },
        auth: AuthConfig {
            api_key: TEST_API_KEY.to_string(),
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            busy_timeout_secs: 5,
        },
        logging: LoggingConfig::default(),
        audit: AuditConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_creation() {
        let app = TestApp::new().await;
        assert!(app.state.config.audit.persist_enabled);
        assert_eq!(app.stored_count().await, 0);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = TestApp::new().await;
        let response = app.get("/api/v1/health").await;
        response.assert_ok();
    }
}
