//! Resource ownership check.
//!
//! Courses belong to an educator, comments and orders to a user. Mutating
//! handlers load the resource, then call [`ensure_owner`] with the
//! authenticated principal's id before touching it.

use std::fmt::Display;

use anyhow::anyhow;

use crate::errors::AppError;

/// A stored resource with a recorded owner.
pub trait Owned {
    type Owner: PartialEq + Display;

    /// Human-readable resource name used in the rejection message.
    const RESOURCE: &'static str;

    fn owner_id(&self) -> &Self::Owner;
}

/// Rejects with 403 unless `principal` is the recorded owner of `resource`.
pub fn ensure_owner<R: Owned>(resource: &R, principal: &R::Owner) -> Result<(), AppError> {
    if resource.owner_id() == principal {
        return Ok(());
    }

    tracing::warn!(
        resource = R::RESOURCE,
        owner = %resource.owner_id(),
        principal = %principal,
        "Ownership check failed"
    );
    Err(AppError::forbidden(anyhow!(
        "You are not allowed to modify this {}",
        R::RESOURCE
    )))
}
