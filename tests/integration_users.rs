mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    FilePart, body_json, create_test_educator, create_test_user, empty_request,
    generate_unique_email, json_request, multipart_request, set_otp, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_register_login_and_profile_scenario(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let email = generate_unique_email();

    let response = app
        .send(multipart_request(
            "POST",
            "/api/user/registration",
            None,
            &[("name", "Ada Lovelace"), ("email", email.as_str()), ("password", "analytical")],
            &[],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));

    let response = app
        .send(json_request(
            "POST",
            "/api/user/login",
            None,
            json!({"email": email, "password": "wrong-password"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    let response = app.send(empty_request("GET", "/api/user/me", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(json_request(
            "POST",
            "/api/user/login",
            None,
            json!({"email": email, "password": "analytical"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app.send(empty_request("GET", "/api/user/me", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], email);
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("verifyOtpHash").is_none());
    assert!(!body.to_string().contains("$2"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_registration_conflicts(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let existing = create_test_user(&pool).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/user/registration",
            None,
            json!({"name": "Someone", "email": existing.email, "password": "password123"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Email already exists");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_registration_validation(pool: PgPool) {
    let app = setup_test_app(pool);

    let response = app
        .send(json_request(
            "POST",
            "/api/user/registration",
            None,
            json!({"name": "Short", "email": generate_unique_email(), "password": "short"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request(
            "POST",
            "/api/user/registration",
            None,
            json!({"name": "Bad", "email": "not-an-email", "password": "password123"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request(
            "POST",
            "/api/user/registration",
            None,
            json!({"email": generate_unique_email(), "password": "password123"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_registration_stores_image_and_rejects_bad_type(pool: PgPool) {
    let app = setup_test_app(pool);
    let email = generate_unique_email();

    let response = app
        .send(multipart_request(
            "POST",
            "/api/user/registration",
            None,
            &[("name", "Grace"), ("email", email.as_str()), ("password", "password123")],
            &[FilePart {
                field: "image",
                file_name: "avatar.png",
                content_type: "image/png",
                bytes: b"\x89PNG fake image",
            }],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let image = body["data"]["user"]["image"].as_str().unwrap();
    assert!(image.starts_with("http://localhost:4000/files/users/images/"));
    assert!(image.ends_with("-avatar.png"));

    let second_email = generate_unique_email();
    let response = app
        .send(multipart_request(
            "POST",
            "/api/user/registration",
            None,
            &[("name", "Grace"), ("email", second_email.as_str()), ("password", "password123")],
            &[FilePart {
                field: "resume",
                file_name: "resume.exe",
                content_type: "application/x-msdownload",
                bytes: b"MZ",
            }],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Unsupported file type!");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_unknown_email_is_not_found(pool: PgPool) {
    let app = setup_test_app(pool);

    let response = app
        .send(json_request(
            "POST",
            "/api/user/login",
            None,
            json!({"email": generate_unique_email(), "password": "password123"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_educator_token_is_rejected_on_user_routes(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let token = app.educator_token(&educator);

    let response = app.send(empty_request("GET", "/api/user/me", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_user_email_conflict_and_success(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let other = create_test_user(&pool).await;
    let token = app.user_token(&user);

    let response = app
        .send(json_request(
            "PUT",
            "/api/user/update-user",
            Some(&token),
            json!({"email": other.email}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .send(json_request(
            "PUT",
            "/api/user/update-user",
            Some(&token),
            json!({"name": "Renamed"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Renamed");
    assert_eq!(body["data"]["email"], user.email);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_email_otp_flow(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    let response = app
        .send(json_request("POST", "/api/user/verify-email-otp", Some(&token), json!({"otp": "123456"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No OTP request found");

    let response = app
        .send(empty_request("POST", "/api/user/send-email-otp", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    set_otp(&pool, "users", user.id, "verify", "654321", Utc::now() + Duration::minutes(5)).await;

    let response = app
        .send(json_request("POST", "/api/user/verify-email-otp", Some(&token), json!({"otp": "000000"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Invalid OTP");

    let response = app
        .send(json_request("POST", "/api/user/verify-email-otp", Some(&token), json!({"otp": "654321"})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(empty_request("GET", "/api/user/me", Some(&token))).await;
    assert_eq!(body_json(response).await["data"]["isAccountVerified"], true);

    // Consumed codes cannot be replayed.
    let response = app
        .send(json_request("POST", "/api/user/verify-email-otp", Some(&token), json!({"otp": "654321"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_otp_is_gone_even_when_correct(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    set_otp(&pool, "users", user.id, "verify", "111222", Utc::now() - Duration::minutes(1)).await;

    let response = app
        .send(json_request("POST", "/api/user/verify-email-otp", Some(&token), json!({"otp": "111222"})))
        .await;
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(body_json(response).await["message"], "OTP expired");

    let cleared: Option<String> =
        sqlx::query_scalar("SELECT verify_otp_hash FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(cleared.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_password_reset_flow(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/user/send-reset-otp",
            None,
            json!({"email": generate_unique_email()}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(json_request("POST", "/api/user/send-reset-otp", None, json!({"email": user.email})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    set_otp(&pool, "users", user.id, "reset", "424242", Utc::now() + Duration::minutes(5)).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/user/verify-reset-otp",
            None,
            json!({"email": user.email, "otp": "424242", "password": "brand-new-password"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(json_request(
            "POST",
            "/api/user/login",
            None,
            json!({"email": user.email, "password": "brand-new-password"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_password_write_keeps_reset_code(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    set_otp(&pool, "users", user.id, "reset", "515151", Utc::now() + Duration::minutes(5)).await;

    sqlx::raw_sql(
        "CREATE FUNCTION reject_password_change() RETURNS trigger AS $$
         BEGIN RAISE EXCEPTION 'password writes disabled'; END;
         $$ LANGUAGE plpgsql;
         CREATE TRIGGER users_password_guard BEFORE UPDATE OF password ON users
         FOR EACH ROW EXECUTE FUNCTION reject_password_change();",
    )
    .execute(&pool)
    .await
    .unwrap();

    let reset = json!({"email": user.email, "otp": "515151", "password": "brand-new-password"});
    let response = app
        .send(json_request("POST", "/api/user/verify-reset-otp", None, reset.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let pending: Option<String> =
        sqlx::query_scalar("SELECT reset_otp_hash FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(pending.is_some());

    sqlx::raw_sql("DROP TRIGGER users_password_guard ON users")
        .execute(&pool)
        .await
        .unwrap();

    let response = app
        .send(json_request("POST", "/api/user/verify-reset-otp", None, reset))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_me_and_directory(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    create_test_user(&pool).await;
    let token = app.user_token(&user);

    let response = app.send(empty_request("GET", "/api/users/users-count", None)).await;
    assert_eq!(body_json(response).await["data"]["count"], 2);

    let response = app
        .send(empty_request("GET", "/api/users/users-total-list?limit=1", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["meta"]["total"], 2);
    assert_eq!(body["data"]["meta"]["hasMore"], true);

    let response = app.send(empty_request("DELETE", "/api/user/me", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(empty_request("GET", "/api/user/me", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
