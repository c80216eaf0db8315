use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use coursehub_core::{ApiResponse, AppError, MessageResponse, Paginated};
use coursehub_models::{
    Course, CourseFilterParams, CourseId, CourseWithEducator, CreateCourseDto, UpdateCourseDto,
};

use crate::middleware::auth::CurrentEducator;
use crate::state::AppState;
use crate::utils::upload::UploadForm;
use crate::validator::IdPath;

use super::service::CourseService;

#[utoipa::path(
    post,
    path = "/api/course/create",
    request_body(content = CreateCourseDto, content_type = "multipart/form-data",
        description = "Course fields (`courseContent` as JSON text) plus an optional `image` file"),
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(educator.id = %educator.id))]
pub async fn create_course(
    State(state): State<AppState>,
    CurrentEducator(educator): CurrentEducator,
    mut form: UploadForm<CreateCourseDto>,
) -> Result<(StatusCode, Json<ApiResponse<Course>>), AppError> {
    let image = form.take_file("image");
    let course = CourseService::create(
        &state.db,
        state.file_storage.as_ref(),
        educator.id,
        form.data,
        image,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Course created successfully", course)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/course/update/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body(content = UpdateCourseDto, content_type = "multipart/form-data",
        description = "Any course fields plus an optional replacement `image`"),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 403, description = "Not the course owner", body = MessageResponse),
        (status = 404, description = "Course not found", body = MessageResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(educator.id = %educator.id, course.id = %id))]
pub async fn update_course(
    State(state): State<AppState>,
    CurrentEducator(educator): CurrentEducator,
    IdPath(id): IdPath<CourseId>,
    form: Result<UploadForm<UpdateCourseDto>, AppError>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = CourseService::get_owned(&state.db, id, educator.id).await?;

    let mut form = form?;
    let image = form.take_file("image");
    let updated =
        CourseService::update(&state.db, state.file_storage.as_ref(), &course, form.data, image)
            .await?;

    Ok(Json(ApiResponse::with_message("Course updated successfully", updated)))
}

#[utoipa::path(
    delete,
    path = "/api/course/delete/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 403, description = "Not the course owner", body = MessageResponse),
        (status = 404, description = "Course not found", body = MessageResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(educator.id = %educator.id, course.id = %id))]
pub async fn delete_course(
    State(state): State<AppState>,
    CurrentEducator(educator): CurrentEducator,
    IdPath(id): IdPath<CourseId>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let course = CourseService::get_owned(&state.db, id, educator.id).await?;
    CourseService::delete(&state.db, state.file_storage.as_ref(), &course).await?;
    Ok(Json(ApiResponse::message("Course deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/course/course/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with its educator", body = CourseWithEducator),
        (status = 404, description = "Course not found", body = MessageResponse)
    ),
    tag = "Courses"
)]
pub async fn get_course(
    State(state): State<AppState>,
    IdPath(id): IdPath<CourseId>,
) -> Result<Json<ApiResponse<CourseWithEducator>>, AppError> {
    let course = CourseService::get_with_educator(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses/getAllCourses",
    params(
        ("educatorId" = Option<Uuid>, Query, description = "Only courses by this educator"),
        ("published" = Option<bool>, Query, description = "Filter on the publication flag"),
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Courses, newest first", body = Paginated<CourseWithEducator>),
        (status = 400, description = "Invalid query parameters", body = MessageResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip_all)]
pub async fn list_courses(
    State(state): State<AppState>,
    filters: Result<Query<CourseFilterParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Paginated<CourseWithEducator>>>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let courses = CourseService::list(&state.db, filters).await?;
    Ok(Json(ApiResponse::ok(courses)))
}
