#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use coursehub::coursehub_auth::{PrincipalKind, create_access_token};
use coursehub::coursehub_config::{
    CorsConfig, EmailConfig, JwtConfig, PaymentConfig, StorageBackend, StorageConfig,
};
use coursehub::coursehub_core::{LocalFileStorage, hash_password};
use coursehub::router::init_router;
use coursehub::state::AppState;
use coursehub::utils::payment::StaticGateway;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const TEST_PASSWORD: &str = "testpass123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: Arc<StaticGateway>,
    pub storage_dir: PathBuf,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub fn user_token(&self, account: &TestAccount) -> String {
        create_access_token(account.id, &account.email, PrincipalKind::User, &self.state.jwt_config)
            .unwrap()
    }

    pub fn educator_token(&self, account: &TestAccount) -> String {
        create_access_token(
            account.id,
            &account.email,
            PrincipalKind::Educator,
            &self.state.jwt_config,
        )
        .unwrap()
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

pub fn setup_test_app(pool: PgPool) -> TestApp {
    let storage_dir = std::env::temp_dir().join(format!("coursehub-test-{}", Uuid::new_v4()));
    let storage_config = StorageConfig {
        backend: StorageBackend::Local,
        local_dir: storage_dir.clone(),
        public_base_url: "http://localhost:4000/files".to_string(),
        endpoint: String::new(),
        access_token: String::new(),
        max_upload_bytes: 1024 * 1024,
    };

    let gateway = Arc::new(StaticGateway::new(TEST_WEBHOOK_SECRET));
    let state = AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        email_config: EmailConfig {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@coursehub.test".to_string(),
            from_name: "CourseHub".to_string(),
        },
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        payment_config: PaymentConfig {
            secret_key: String::new(),
            webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
            api_base: "https://api.stripe.test".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            currency: "usd".to_string(),
            service_fee_cents: 0,
        },
        file_storage: Arc::new(LocalFileStorage::new(
            storage_dir.clone(),
            storage_config.public_base_url.clone(),
            storage_config.max_upload_bytes,
        )),
        storage_config,
        payment_gateway: gateway.clone(),
    };

    TestApp {
        router: init_router(state.clone()),
        state,
        gateway,
        storage_dir,
    }
}

pub struct TestAccount {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

async fn insert_account(pool: &PgPool, table: &str, name: &str) -> TestAccount {
    let email = generate_unique_email();
    let hashed = hash_password(TEST_PASSWORD).unwrap();

    let id: Uuid = sqlx::query_scalar(&format!(
        "INSERT INTO {} (name, email, password) VALUES ($1, $2, $3) RETURNING id",
        table
    ))
    .bind(name)
    .bind(&email)
    .bind(hashed)
    .fetch_one(pool)
    .await
    .unwrap();

    TestAccount {
        id,
        email,
        password: TEST_PASSWORD.to_string(),
    }
}

pub async fn create_test_user(pool: &PgPool) -> TestAccount {
    insert_account(pool, "users", "Test User").await
}

pub async fn create_test_educator(pool: &PgPool) -> TestAccount {
    insert_account(pool, "educators", "Test Educator").await
}

pub async fn create_test_course(pool: &PgPool, educator_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO courses (educator_id, course_title, course_description, course_price, discount)
         VALUES ($1, 'Test Course', 'A course for tests', 49.99, 10)
         RETURNING id",
    )
    .bind(educator_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_comment(pool: &PgPool, user_id: Uuid, course_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO comments (user_id, course_id, comment) VALUES ($1, $2, 'Great course') RETURNING id",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Stores a known one-time code for `purpose_prefix` (`verify` or `reset`).
pub async fn set_otp(
    pool: &PgPool,
    table: &str,
    account_id: Uuid,
    purpose_prefix: &str,
    code: &str,
    expires_at: DateTime<Utc>,
) {
    sqlx::query(&format!(
        "UPDATE {table} SET {p}_otp_hash = $1, {p}_otp_expires_at = $2 WHERE id = $3",
        table = table,
        p = purpose_prefix
    ))
    .bind(hash_password(code).unwrap())
    .bind(expires_at)
    .bind(account_id)
    .execute(pool)
    .await
    .unwrap();
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

const BOUNDARY: &str = "----coursehub-test-boundary";

pub fn multipart_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    files: &[FilePart<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
