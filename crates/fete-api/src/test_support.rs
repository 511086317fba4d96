//! Drives the real router against an in-memory store and a fake media host.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use fete_db::Store;
use fete_db::memory::MemoryStore;
use fete_types::models::Admin;

use crate::auth::create_token;
use crate::media::MediaHost;
use crate::media::fake::FakeMediaHost;
use crate::rate_limit::RateLimiter;
use crate::routes::app;
use crate::state::AppStateInner;

pub const JWT_SECRET: &str = "test-secret";
pub const ADMIN_EMAIL: &str = "admin@fete.test";

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub media: Arc<FakeMediaHost>,
    pub admin: Admin,
    pub token: String,
    router: Router,
}

pub struct Builder {
    password_hash: String,
    with_media: bool,
    rate_limit: u32,
    expose_details: bool,
}

impl Builder {
    pub fn password_hash(mut self, hash: String) -> Self {
        self.password_hash = hash;
        self
    }

    pub fn without_media(mut self) -> Self {
        self.with_media = false;
        self
    }

    pub fn rate_limit(mut self, max: u32) -> Self {
        self.rate_limit = max;
        self
    }

    pub fn expose_details(mut self) -> Self {
        self.expose_details = true;
        self
    }

    pub async fn build(self) -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(FakeMediaHost::new());
        let admin = store.add_admin(ADMIN_EMAIL, &self.password_hash).await;
        let token = create_token(JWT_SECRET, admin.id, &admin.email).unwrap();

        let state = Arc::new(AppStateInner {
            store: store.clone() as Arc<dyn Store>,
            media: self
                .with_media
                .then(|| media.clone() as Arc<dyn MediaHost>),
            jwt_secret: JWT_SECRET.to_string(),
        });
        let limiter = Arc::new(RateLimiter::new(
            self.rate_limit,
            Duration::from_secs(900),
            false,
        ));

        TestApp {
            store,
            media,
            admin,
            token,
            router: app(state, limiter, self.expose_details),
        }
    }
}

impl TestApp {
    pub fn builder() -> Builder {
        Builder {
            password_hash: "not-a-real-hash".to_string(),
            with_media: true,
            rate_limit: 1000,
            expose_details: false,
        }
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.unwrap()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, None, Some(body)).await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(method, uri, Some(&self.token), body).await
    }

    /// Create a celebration through the API and return its body.
    pub async fn create_celebration(&self, body: Value) -> Value {
        let (status, created) = self.admin("POST", "/api/celebrations", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        created
    }

    pub async fn simple_celebration(&self, slug: &str) -> i64 {
        let created = self
            .create_celebration(json!({ "title": "Anna & Ben", "slug": slug }))
            .await;
        created["id"].as_i64().unwrap()
    }
}

/// A single-part multipart body.
pub fn multipart_request(
    uri: &str,
    token: &str,
    field: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    const BOUNDARY: &str = "fete-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
