//! Shared helpers used by the feature modules.
//!
//! - [`email`]: SMTP delivery of one-time codes
//! - [`otp`]: one-time code generation and checking
//! - [`payment`]: the hosted checkout gateway
//! - [`upload`]: multipart parsing and file storage

pub mod email;
pub mod otp;
pub mod payment;
pub mod upload;
