//! Request extractors for the two authentication gates.
//!
//! - [`auth::CurrentUser`]: requires a user token and a live user record
//! - [`auth::CurrentEducator`]: requires an educator token and a live educator record
//!
//! A token issued for one kind is rejected by the other gate with 401.

pub mod auth;
