//! Common test utilities for API integration tests
//!
//! Builds the real router over a PostgreSQL database given by `DATABASE_URL`.
//! Without it [`TestContext::new`] returns `None` and the test returns early.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
use taskboard_shared::models::user::{CreateUser, User};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-chars";

/// Router plus the pool behind it
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
}

/// A user with a valid access token
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

/// Status and parsed JSON body (`Value::Null` for empty bodies)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping API test");
            return None;
        };

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: url.clone(),
                max_connections: 5,
                run_migrations: true,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
        };

        let db = PgPool::connect(&url).await.expect("Failed to connect");

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("Migrations failed");

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Some(Self { db, app, config })
    }

    /// Inserts a user directly and signs an access token for it
    pub async fn user(&self, prefix: &str) -> TestUser {
        let user = User::create(
            &self.db,
            CreateUser {
                name: format!("{}-{}", prefix, Uuid::new_v4()),
                password_hash: "not-a-real-hash".to_string(),
            },
        )
        .await
        .expect("Failed to create user");

        let claims = Claims::new(user.id, user.name.clone(), TokenType::Access);
        let token = create_token(&claims, &self.config.jwt.secret).expect("Failed to sign token");

        TestUser { user, token }
    }

    /// Sends a request, with a JSON body and bearer token when given
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, as_user: &TestUser) -> TestResponse {
        self.send("GET", uri, Some(&as_user.token), None).await
    }

    pub async fn post(&self, uri: &str, as_user: &TestUser, body: Value) -> TestResponse {
        self.send("POST", uri, Some(&as_user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, as_user: &TestUser, body: Value) -> TestResponse {
        self.send("PATCH", uri, Some(&as_user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, as_user: &TestUser, body: Value) -> TestResponse {
        self.send("PUT", uri, Some(&as_user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, as_user: &TestUser) -> TestResponse {
        self.send("DELETE", uri, Some(&as_user.token), None).await
    }
}

/// Reads a UUID field from a JSON body
pub fn id_of(body: &Value, field: &str) -> Uuid {
    body[field]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("missing uuid field '{}' in {}", field, body))
}
