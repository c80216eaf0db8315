use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use coursehub_core::{MessageResponse, PaginationMeta};
use coursehub_models::{
    CartItemDto, CartResponse, Chapter, Comment, CommentDetails, CommentWithAuthor,
    CountResponse, Course, CourseWithEducator, CreateCommentDto, CreateCourseDto, Educator,
    EducatorAuthResponse, EducatorSummary, Lecture, Like, LikeCount, LikeDetails, LikeDto,
    LoginDto, Order, OrderItem, PlaceOrderDto, PlaceOrderResponse, RegisterAccountDto,
    RequestResetOtpDto, ResetPasswordDto, ToggleLikeResponse, UpdateAccountDto,
    UpdateCommentDto, UpdateCourseDto, User, UserAuthResponse, UserSummary, VerifyOrderDto,
    VerifyOrderResponse, VerifyOtpDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::router::health,
        crate::router::ready,
        crate::modules::users::controller::register_user,
        crate::modules::users::controller::login_user,
        crate::modules::users::controller::get_me,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_me,
        crate::modules::users::controller::send_email_otp,
        crate::modules::users::controller::verify_email_otp,
        crate::modules::users::controller::send_reset_otp,
        crate::modules::users::controller::verify_reset_otp,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::count_users,
        crate::modules::educators::controller::register_educator,
        crate::modules::educators::controller::login_educator,
        crate::modules::educators::controller::get_educator,
        crate::modules::educators::controller::update_educator,
        crate::modules::educators::controller::delete_educator,
        crate::modules::educators::controller::send_otp_email,
        crate::modules::educators::controller::verify_otp_mail,
        crate::modules::educators::controller::send_reset_otp,
        crate::modules::educators::controller::verify_reset_otp,
        crate::modules::educators::controller::list_educators,
        crate::modules::educators::controller::count_educators,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::list_courses,
        crate::modules::comments::controller::create_comment,
        crate::modules::comments::controller::update_comment,
        crate::modules::comments::controller::delete_comment,
        crate::modules::comments::controller::get_comment,
        crate::modules::comments::controller::list_comments,
        crate::modules::likes::controller::like_comment,
        crate::modules::likes::controller::toggle_like,
        crate::modules::likes::controller::likes_count,
        crate::modules::likes::controller::total_likes,
        crate::modules::likes::controller::likes_count_all,
        crate::modules::cart::controller::add_to_cart,
        crate::modules::cart::controller::remove_from_cart,
        crate::modules::cart::controller::get_cart,
        crate::modules::orders::controller::place_order,
        crate::modules::orders::controller::verify_order,
        crate::modules::orders::controller::payment_webhook,
        crate::modules::orders::controller::my_orders,
    ),
    components(
        schemas(
            MessageResponse,
            PaginationMeta,
            User,
            UserSummary,
            Educator,
            EducatorSummary,
            RegisterAccountDto,
            LoginDto,
            UpdateAccountDto,
            VerifyOtpDto,
            RequestResetOtpDto,
            ResetPasswordDto,
            UserAuthResponse,
            EducatorAuthResponse,
            CountResponse,
            Course,
            CourseWithEducator,
            Chapter,
            Lecture,
            CreateCourseDto,
            UpdateCourseDto,
            Comment,
            CommentWithAuthor,
            CommentDetails,
            CreateCommentDto,
            UpdateCommentDto,
            Like,
            LikeDetails,
            LikeDto,
            LikeCount,
            ToggleLikeResponse,
            CartItemDto,
            CartResponse,
            Order,
            OrderItem,
            PlaceOrderDto,
            PlaceOrderResponse,
            VerifyOrderDto,
            VerifyOrderResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Learner accounts and one-time codes"),
        (name = "Educators", description = "Educator accounts and one-time codes"),
        (name = "Courses", description = "Course catalogue"),
        (name = "Comments", description = "Course comments"),
        (name = "Likes", description = "Comment likes"),
        (name = "Cart", description = "Per-user cart"),
        (name = "Orders", description = "Orders and payment confirmation"),
        (name = "System", description = "Health and readiness")
    ),
    info(
        title = "CourseHub API",
        version = "0.1.0",
        description = "Course marketplace REST API built with Rust, Axum and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
