//! Courses and their chapter/lecture outline.

use chrono::{DateTime, Utc};
use coursehub_core::PaginationParams;
use coursehub_core::ownership::Owned;
use coursehub_core::serde::{
    deserialize_f64, deserialize_json_or_string, deserialize_optional_bool,
    deserialize_optional_f64, deserialize_optional_uuid,
};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::accounts::EducatorSummary;
use crate::ids::{CourseId, EducatorId};

pub const COURSE_COLUMNS: &str = "c.id, c.educator_id, c.course_title, c.course_description, \
     c.course_price, c.discount, c.course_content, c.image, c.is_published, c.created_at, c.updated_at";

pub const INVALID_COURSE_CONTENT: &str = "Invalid courseContent format. Must be valid JSON.";

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub lecture_id: String,
    pub lecture_title: String,
    /// Minutes
    pub lecture_duration: f64,
    pub lecture_url: String,
    #[serde(default = "default_true")]
    pub is_preview_free: bool,
    pub lecture_order: i32,
}

/// Order fields are caller-supplied and not checked for uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub chapter_id: String,
    pub chapter_order: i32,
    pub chapter_title: String,
    #[serde(default)]
    pub chapter_content: Vec<Lecture>,
}

fn deserialize_course_content<'de, D>(deserializer: D) -> Result<Vec<Chapter>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_json_or_string(deserializer).map_err(|_: D::Error| D::Error::custom(INVALID_COURSE_CONTENT))
}

fn deserialize_optional_course_content<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<Chapter>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_course_content(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub educator_id: EducatorId,
    pub course_title: String,
    pub course_description: String,
    pub course_price: f64,
    /// Percentage, 0-100
    pub discount: f64,
    #[schema(value_type = Vec<Chapter>)]
    pub course_content: Json<Vec<Chapter>>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Course {
    type Owner = EducatorId;
    const RESOURCE: &'static str = "course";

    fn owner_id(&self) -> &EducatorId {
        &self.educator_id
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithEducator {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub course: Course,
    #[sqlx(flatten)]
    pub educator: EducatorSummary,
}

/// Create payload. Arrives as multipart text fields or as JSON.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseDto {
    #[validate(custom(function = "crate::validation::not_blank", message = "Course title is required"))]
    pub course_title: String,
    #[validate(custom(
        function = "crate::validation::not_blank",
        message = "Course description is required"
    ))]
    pub course_description: String,
    #[serde(deserialize_with = "deserialize_f64")]
    #[validate(range(min = 0.0, message = "Course price cannot be negative"))]
    pub course_price: f64,
    #[serde(deserialize_with = "deserialize_f64")]
    #[validate(range(min = 0.0, max = 100.0, message = "Discount must be between 0 and 100"))]
    pub discount: f64,
    #[serde(default, deserialize_with = "deserialize_course_content")]
    pub course_content: Vec<Chapter>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseDto {
    #[validate(custom(function = "crate::validation::not_blank", message = "Course title cannot be empty"))]
    pub course_title: Option<String>,
    #[validate(custom(
        function = "crate::validation::not_blank",
        message = "Course description cannot be empty"
    ))]
    pub course_description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    #[validate(range(min = 0.0, message = "Course price cannot be negative"))]
    pub course_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    #[validate(range(min = 0.0, max = 100.0, message = "Discount must be between 0 and 100"))]
    pub discount: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_course_content")]
    pub course_content: Option<Vec<Chapter>>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseFilterParams {
    /// Only courses owned by this educator
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub educator_id: Option<Uuid>,
    /// Filter on the publication flag
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub published: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
