//! # CourseHub Auth
//!
//! Bearer tokens for the two principal kinds, learners ([`PrincipalKind::User`])
//! and course owners ([`PrincipalKind::Educator`]).
//!
//! The kind is embedded in the token, so a token issued to one kind is
//! rejected wherever the other kind is required.
//!
//! ```ignore
//! let token = create_access_token(user_id, "ada@example.com", PrincipalKind::User, &config)?;
//! let claims = verify_token_for(&token, PrincipalKind::User, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, PrincipalKind};
pub use jwt::{create_access_token, verify_token, verify_token_for};
