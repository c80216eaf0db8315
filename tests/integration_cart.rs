mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_test_course, create_test_educator, create_test_user, empty_request,
    json_request, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
async fn test_add_increments_quantity(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, educator.id).await;
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    for expected in 1..=2 {
        let response = app
            .send(json_request("POST", "/api/cart/add", Some(&token), json!({"itemId": course_id})))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Added to cart");
        assert_eq!(body["data"]["cartData"][course_id.to_string()], expected);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_add_then_remove_restores_cart(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let kept = create_test_course(&pool, educator.id).await;
    let added = create_test_course(&pool, educator.id).await;
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    app.send(json_request("POST", "/api/cart/add", Some(&token), json!({"itemId": kept})))
        .await;
    let before = body_json(app.send(empty_request("GET", "/api/cart", Some(&token))).await).await;

    app.send(json_request("POST", "/api/cart/add", Some(&token), json!({"itemId": added})))
        .await;
    let response = app
        .send(json_request("POST", "/api/cart/remove", Some(&token), json!({"itemId": added})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Removed from cart");

    let after = body_json(app.send(empty_request("GET", "/api/cart", Some(&token))).await).await;
    assert_eq!(after["data"], before["data"]);
    assert_eq!(after["data"]["cartData"], json!({ kept.to_string(): 1 }));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_cart_by_post(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    let response = app
        .send(json_request("POST", "/api/cart/get", Some(&token), json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["cartData"], json!({}));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cart_rejections(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, educator.id).await;
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    let response = app
        .send(json_request("POST", "/api/cart/remove", Some(&token), json!({"itemId": course_id})))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Item not found in cart");

    let response = app
        .send(json_request("POST", "/api/cart/add", Some(&token), json!({"itemId": Uuid::new_v4()})))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(json_request("POST", "/api/cart/add", Some(&token), json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(empty_request("GET", "/api/cart", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let educator_token = app.educator_token(&educator);
    let response = app.send(empty_request("GET", "/api/cart", Some(&educator_token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
