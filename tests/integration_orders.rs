mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use common::{
    TEST_WEBHOOK_SECRET, TestApp, TestAccount, body_json, create_test_course,
    create_test_educator, create_test_user, empty_request, json_request, setup_test_app,
};
use coursehub::utils::payment::sign_payload;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

fn order_body(course_id: Uuid) -> Value {
    json!({
        "items": [{"name": "Test Course", "price": 44.99, "quantity": 1, "courseId": course_id}],
        "address": {"firstName": "Ada", "email": "ada@example.com", "country": "UK"},
        "amount": 44.99
    })
}

async fn place_order(app: &TestApp, pool: &PgPool, user: &TestAccount) -> Uuid {
    let educator = create_test_educator(pool).await;
    let course_id = create_test_course(pool, educator.id).await;
    let token = app.user_token(user);

    let response = app
        .send(json_request("POST", "/api/order/place", Some(&token), order_body(course_id)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    Uuid::parse_str(body["data"]["orderId"].as_str().unwrap()).unwrap()
}

async fn is_paid(pool: &PgPool, order_id: Uuid) -> Option<bool> {
    sqlx::query_scalar("SELECT payment FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await
        .unwrap()
}

fn webhook_request(payload: &Value, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/order/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_place_order_opens_checkout_and_clears_cart(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, educator.id).await;
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    app.send(json_request("POST", "/api/cart/add", Some(&token), json!({"itemId": course_id})))
        .await;

    let response = app
        .send(json_request("POST", "/api/order/place", Some(&token), order_body(course_id)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Order placed");

    let order_id = Uuid::parse_str(body["data"]["orderId"].as_str().unwrap()).unwrap();
    assert_eq!(
        body["data"]["sessionUrl"],
        format!("https://checkout.test/pay/cs_test_{}", order_id.simple())
    );
    assert_eq!(is_paid(&pool, order_id).await, Some(false));

    let requests = app.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].lines.len(), 1);
    assert_eq!(requests[0].lines[0].unit_amount_cents, 4499);

    let response = app.send(empty_request("GET", "/api/cart", Some(&token))).await;
    assert_eq!(body_json(response).await["data"]["cartData"], json!({}));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_checkout_leaves_no_order(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, educator.id).await;
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);
    app.gateway.set_fail_checkout(true);

    let response = app
        .send(json_request("POST", "/api/order/place", Some(&token), order_body(course_id)))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_place_order_validation(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    let response = app
        .send(json_request(
            "POST",
            "/api/order/place",
            Some(&token),
            json!({"items": [], "address": {"city": "Paris"}, "amount": 0}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.gateway.requests().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_requires_owner(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let owner = create_test_user(&pool).await;
    let order_id = place_order(&app, &pool, &owner).await;
    let other = create_test_user(&pool).await;
    let token = app.user_token(&other);

    let response = app
        .send(json_request(
            "POST",
            "/api/order/verify",
            Some(&token),
            json!({"orderId": order_id, "success": "false"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(is_paid(&pool, order_id).await, Some(false));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancelled_checkout_removes_order(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let order_id = place_order(&app, &pool, &user).await;
    let token = app.user_token(&user);

    let response = app
        .send(json_request(
            "POST",
            "/api/order/verify",
            Some(&token),
            json!({"orderId": order_id, "success": "false"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Payment cancelled");
    assert_eq!(body["data"]["paid"], false);
    assert_eq!(is_paid(&pool, order_id).await, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancelled_redirect_keeps_order_the_gateway_charged(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let order_id = place_order(&app, &pool, &user).await;
    let token = app.user_token(&user);
    app.gateway.set_paid(true);

    let response = app
        .send(json_request(
            "POST",
            "/api/order/verify",
            Some(&token),
            json!({"orderId": order_id, "success": false}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Payment successful");
    assert_eq!(body["data"]["paid"], true);
    assert_eq!(is_paid(&pool, order_id).await, Some(true));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_success_needs_gateway_confirmation(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let order_id = place_order(&app, &pool, &user).await;
    let token = app.user_token(&user);

    let response = app
        .send(json_request(
            "POST",
            "/api/order/verify",
            Some(&token),
            json!({"orderId": order_id, "success": true}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Payment not confirmed");
    assert_eq!(is_paid(&pool, order_id).await, Some(false));

    app.gateway.set_paid(true);
    let response = app
        .send(json_request(
            "POST",
            "/api/order/verify",
            Some(&token),
            json!({"orderId": order_id, "success": "true"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Payment successful");
    assert_eq!(body["data"]["paid"], true);
    assert_eq!(is_paid(&pool, order_id).await, Some(true));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_webhook_completes_payment(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let order_id = place_order(&app, &pool, &user).await;

    let payload = json!({
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": format!("cs_test_{}", order_id.simple()),
            "metadata": {"orderId": order_id.to_string()}
        }}
    });
    let signature = sign_payload(
        TEST_WEBHOOK_SECRET,
        Utc::now().timestamp(),
        payload.to_string().as_bytes(),
    );

    let response = app.send(webhook_request(&payload, Some(signature))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(is_paid(&pool, order_id).await, Some(true));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_webhook_rejects_bad_signatures(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let order_id = place_order(&app, &pool, &user).await;

    let payload = json!({
        "type": "checkout.session.completed",
        "data": {"object": {"id": format!("cs_test_{}", order_id.simple())}}
    });

    let response = app.send(webhook_request(&payload, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Missing Stripe-Signature header");

    let forged = sign_payload("whsec_wrong", Utc::now().timestamp(), payload.to_string().as_bytes());
    let response = app.send(webhook_request(&payload, Some(forged))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stale = sign_payload(
        TEST_WEBHOOK_SECRET,
        Utc::now().timestamp() - 3600,
        payload.to_string().as_bytes(),
    );
    let response = app.send(webhook_request(&payload, Some(stale))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(is_paid(&pool, order_id).await, Some(false));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_my_orders(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    let response = app
        .send(empty_request("GET", "/api/order/my-orders", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "No orders found");

    let order_id = place_order(&app, &pool, &user).await;
    let response = app
        .send(empty_request("GET", "/api/order/my-orders", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order_id.to_string());
    assert_eq!(orders[0]["payment"], false);
    assert!(orders[0]["items"][0]["courseId"].is_string());
    assert!(orders[0].get("checkoutSessionId").is_none());
}
