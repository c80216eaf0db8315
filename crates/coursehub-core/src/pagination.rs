//! Page-based pagination for list endpoints.
//!
//! List endpoints accept `?page=2&limit=20`. Both parameters are optional;
//! empty strings are treated as absent so that forms can submit blank
//! inputs. `limit` is clamped to `[1, 100]` and `page` to `>= 1`. Offsets
//! saturate, so an absurd page number yields an empty page.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::serde::deserialize_optional_i64;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PaginationParams {
    /// Items per page (1-100, default 20)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// 1-indexed page number (default 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Metadata for a page of results out of `total` matches.
    #[must_use]
    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta {
            total,
            limit: self.limit(),
            page: self.page(),
            has_more: self.offset().saturating_add(self.limit()) < total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: i64,
    pub limit: i64,
    pub page: i64,
    pub has_more: bool,
}

/// A page of results with its metadata.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}
