use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

use super::controller::{create_course, delete_course, get_course, list_courses, update_course};

pub fn init_course_router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_course))
        .route("/update/{id}", put(update_course))
        .route("/delete/{id}", delete(delete_course))
        .route("/course/{id}", get(get_course))
}

pub fn init_courses_router() -> Router<AppState> {
    Router::new().route("/getAllCourses", get(list_courses))
}
