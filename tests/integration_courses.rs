mod common;

use axum::http::StatusCode;
use common::{
    FilePart, body_json, create_test_course, create_test_educator, create_test_user,
    empty_request, json_request, multipart_request, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

const OUTLINE: &str = r#"[{"chapterId":"ch1","chapterOrder":1,"chapterTitle":"Getting started","chapterContent":[{"lectureId":"l1","lectureTitle":"Installing the toolchain","lectureDuration":7.5,"lectureUrl":"https://videos.test/l1","lectureOrder":1}]}]"#;

#[sqlx::test(migrations = "./migrations")]
async fn test_create_course_from_json(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let token = app.educator_token(&educator);

    let response = app
        .send(json_request(
            "POST",
            "/api/course/create",
            Some(&token),
            json!({
                "courseTitle": "Systems Programming",
                "courseDescription": "Memory, threads and I/O",
                "coursePrice": 79.0,
                "discount": 20,
                "courseContent": serde_json::from_str::<serde_json::Value>(OUTLINE).unwrap(),
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Course created successfully");
    assert_eq!(body["data"]["educatorId"], educator.id.to_string());
    assert_eq!(body["data"]["isPublished"], true);
    assert_eq!(
        body["data"]["courseContent"][0]["chapterContent"][0]["isPreviewFree"],
        true
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_course_from_multipart_with_image(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let token = app.educator_token(&educator);

    let response = app
        .send(multipart_request(
            "POST",
            "/api/course/create",
            Some(&token),
            &[
                ("courseTitle", "Async Rust"),
                ("courseDescription", "Futures and executors"),
                ("coursePrice", "39.99"),
                ("discount", "0"),
                ("courseContent", OUTLINE),
                ("isPublished", "false"),
            ],
            &[FilePart {
                field: "image",
                file_name: "cover.png",
                content_type: "image/png",
                bytes: b"\x89PNG\r\n\x1a\nfake",
            }],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["coursePrice"], 39.99);
    assert_eq!(body["data"]["isPublished"], false);
    let image = body["data"]["image"].as_str().unwrap();
    assert!(image.starts_with("http://localhost:4000/files/courses/images/"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_course_content_is_rejected(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let token = app.educator_token(&educator);

    let response = app
        .send(multipart_request(
            "POST",
            "/api/course/create",
            Some(&token),
            &[
                ("courseTitle", "Broken"),
                ("courseDescription", "Bad outline"),
                ("coursePrice", "10"),
                ("discount", "0"),
                ("courseContent", "[{not json"),
            ],
            &[],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Invalid courseContent format. Must be valid JSON."
    );

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_user_cannot_create_course(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = create_test_user(&pool).await;
    let token = app.user_token(&user);

    let response = app
        .send(json_request(
            "POST",
            "/api/course/create",
            Some(&token),
            json!({"courseTitle": "x", "courseDescription": "y", "coursePrice": 1, "discount": 0}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_owner_updates_course(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, educator.id).await;
    let token = app.educator_token(&educator);

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/course/update/{}", course_id),
            Some(&token),
            json!({"courseTitle": "Renamed", "discount": "25"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["courseTitle"], "Renamed");
    assert_eq!(body["data"]["discount"], 25.0);
    assert_eq!(body["data"]["coursePrice"], 49.99);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_owner_is_forbidden_before_payload_checks(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let owner = create_test_educator(&pool).await;
    let intruder = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, owner.id).await;
    let token = app.educator_token(&intruder);

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/course/update/{}", course_id),
            Some(&token),
            json!({"discount": 500}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/course/delete/{}", course_id),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let title: String = sqlx::query_scalar("SELECT course_title FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(title, "Test Course");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_owner_update_with_invalid_payload(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, educator.id).await;
    let token = app.educator_token(&educator);

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/course/update/{}", course_id),
            Some(&token),
            json!({"discount": 500}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_missing_and_malformed_course_ids(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let token = app.educator_token(&educator);

    let response = app
        .send(empty_request(
            "GET",
            &format!("/api/course/course/{}", uuid::Uuid::new_v4()),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Course not found");

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/course/delete/{}", uuid::Uuid::new_v4()),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(empty_request("GET", "/api/course/course/not-a-uuid", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_course_includes_educator(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, educator.id).await;

    let response = app
        .send(empty_request("GET", &format!("/api/course/course/{}", course_id), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], course_id.to_string());
    assert_eq!(body["data"]["educator"]["email"], educator.email);
    assert!(body["data"]["educator"].get("password").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_courses_with_filters(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let first = create_test_educator(&pool).await;
    let second = create_test_educator(&pool).await;
    create_test_course(&pool, first.id).await;
    let hidden = create_test_course(&pool, first.id).await;
    create_test_course(&pool, second.id).await;

    sqlx::query("UPDATE courses SET is_published = FALSE WHERE id = $1")
        .bind(hidden)
        .execute(&pool)
        .await
        .unwrap();

    let response = app
        .send(empty_request("GET", "/api/courses/getAllCourses", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["meta"]["total"], 3);

    let response = app
        .send(empty_request(
            "GET",
            &format!("/api/courses/getAllCourses?educatorId={}&published=true", first.id),
            None,
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["educator"]["id"], first.id.to_string());

    let response = app
        .send(empty_request("GET", "/api/courses/getAllCourses?limit=2&page=2", None))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["meta"]["hasMore"], false);

    let response = app
        .send(empty_request("GET", "/api/courses/getAllCourses?educatorId=nope", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_course_cleans_carts(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    let course_id = create_test_course(&pool, educator.id).await;
    let kept_id = create_test_course(&pool, educator.id).await;
    let user = create_test_user(&pool).await;
    let user_token = app.user_token(&user);

    for id in [course_id, kept_id] {
        let response = app
            .send(json_request("POST", "/api/cart/add", Some(&user_token), json!({"itemId": id})))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let token = app.educator_token(&educator);
    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/course/delete/{}", course_id),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Course deleted successfully");

    let response = app.send(empty_request("GET", "/api/cart", Some(&user_token))).await;
    assert_eq!(
        body_json(response).await["data"]["cartData"],
        json!({ kept_id.to_string(): 1 })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_far_page_is_empty(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let educator = create_test_educator(&pool).await;
    create_test_course(&pool, educator.id).await;

    let response = app
        .send(empty_request(
            "GET",
            "/api/courses/getAllCourses?page=9223372036854775807&limit=100",
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["meta"]["hasMore"], false);
}
