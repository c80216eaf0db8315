//! # CourseHub Models
//!
//! Database entities, request DTOs and response shapes for the CourseHub API.
//! Wire names are camelCase throughout.
//!
//! - [`ids`]: typed `Uuid` newtypes per entity
//! - [`accounts`]: users, educators, login and one-time-code payloads
//! - [`cart`]: the per-user cart map
//! - [`courses`]: courses with their chapter/lecture outline
//! - [`comments`]: course comments
//! - [`likes`]: comment likes
//! - [`orders`]: orders and checkout payloads

pub mod accounts;
pub mod cart;
pub mod comments;
pub mod courses;
pub mod ids;
pub mod likes;
pub mod orders;
pub mod validation;

pub use accounts::{
    AccountCredentials, CountResponse, Educator, EducatorAuthResponse, EducatorSummary,
    LoginDto, OtpPurpose, OtpRecord, RegisterAccountDto, RequestResetOtpDto, ResetPasswordDto,
    UpdateAccountDto, User, UserAuthResponse, UserSummary, VerifyOtpDto,
};
pub use cart::{CartData, CartItemDto, CartResponse};
pub use comments::{
    Comment, CommentDetails, CommentFilterParams, CommentWithAuthor, CreateCommentDto,
    UpdateCommentDto,
};
pub use courses::{
    Chapter, Course, CourseFilterParams, CourseWithEducator, CreateCourseDto, Lecture,
    UpdateCourseDto,
};
pub use ids::{CommentId, CourseId, EducatorId, LikeId, OrderId, UserId};
pub use likes::{Like, LikeCount, LikeDetails, LikeDto, ToggleLikeResponse};
pub use orders::{
    Order, OrderItem, PlaceOrderDto, PlaceOrderResponse, VerifyOrderDto, VerifyOrderResponse,
};
