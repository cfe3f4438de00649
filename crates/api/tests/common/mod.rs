#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};

use warden_api::config::{self, PolicyConfig};
use warden_auth::{Role, SessionClaims};

pub const SECRET: &str = "test-secret";

pub struct TestServer {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serve the default policy.
    pub async fn spawn() -> Self {
        Self::spawn_with(config::default_policy().expect("default policy is valid")).await
    }

    pub async fn spawn_with(policy: PolicyConfig) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = warden_api::app::build_app(SECRET, policy).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn mint_jwt(secret: &str, sub: &str, roles: &[&'static str]) -> String {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: sub.to_string(),
        roles: roles.iter().map(|r| Role::new(*r)).collect(),
        iat: now - ChronoDuration::seconds(5),
        exp: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

pub fn admin_token() -> String {
    mint_jwt(SECRET, "test@aliencube.org", &["Admin"])
}

pub fn user_token() -> String {
    mint_jwt(SECRET, "user@aliencube.org", &["User"])
}
