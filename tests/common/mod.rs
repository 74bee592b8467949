#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::PasswordHasher;
use chirpy::clock::MockClock;
use chirpy::configuration::{JwtSettings, Platform};
use chirpy::startup::{run, Repositories, ServerSettings};
use chirpy::store::MemoryStore;
use serde_json::{json, Value};

pub const EMAIL: &str = "a@example.com";
pub const PASSWORD: &str = "pw123456";

pub struct TestApp {
    pub address: String,
    pub clock: Arc<MockClock>,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    spawn_app_on(Platform::Dev)
}

pub fn spawn_app_on(platform: Platform) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let clock = Arc::new(MockClock::default());
    let jwt = JwtSettings {
        secret: "integration-test-secret".to_string(),
    };
    let settings = ServerSettings {
        hasher: PasswordHasher::with_cost(4),
        clock: clock.clone(),
        ..ServerSettings::new(jwt, platform)
    };

    let repositories = Repositories::from_store(Arc::new(MemoryStore::new()));
    let server = run(listener, repositories, settings).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        clock,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Registers `email` and logs in, returning the login response body
    pub async fn signed_in(&self, email: &str) -> Value {
        let created = self.create_user(email, PASSWORD).await;
        assert_eq!(created.status().as_u16(), 201);

        let response = self
            .login(json!({ "email": email, "password": PASSWORD }))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse login response")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn token_of(body: &Value, field: &str) -> String {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("missing {} in {}", field, body))
        .to_string()
}
