//! # CourseHub Core
//!
//! Foundational types shared by every CourseHub crate:
//!
//! - [`errors`]: the [`AppError`] type and its HTTP failure envelope
//! - [`response`]: the [`ApiResponse`] success envelope
//! - [`ownership`]: the single owner check used by every mutating handler
//! - [`password`]: bcrypt hashing for credentials and one-time codes
//! - [`file_storage`]: the [`FileStorage`] trait and its backends
//! - [`pagination`]: page/limit query parameters and response metadata
//! - [`serde`]: lenient deserializers for multipart form values
//!
//! # Example
//!
//! ```ignore
//! use coursehub_core::{AppError, ensure_owner, hash_password};
//!
//! let hash = hash_password("correct horse battery")?;
//! ensure_owner(&course, &educator_id)?;
//! return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
//! ```

pub mod errors;
pub mod file_storage;
pub mod ownership;
pub mod pagination;
pub mod password;
pub mod response;
pub mod serde;

pub use errors::AppError;
pub use file_storage::{FileStorage, HttpObjectStorage, LocalFileStorage, StorageError};
pub use ownership::{Owned, ensure_owner};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use response::{ApiResponse, MessageResponse};
