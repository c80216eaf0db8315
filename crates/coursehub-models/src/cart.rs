//! Cart stored on the user record.
//!
//! The cart maps a course id to a positive quantity. A key whose quantity
//! would drop to zero is removed, so adding then removing a course leaves
//! the cart exactly as it was.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ids::CourseId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartData(BTreeMap<CourseId, u32>);

impl CartData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `course_id`, returning the new quantity.
    pub fn add(&mut self, course_id: CourseId) -> u32 {
        let quantity = self.0.entry(course_id).or_insert(0);
        *quantity = quantity.saturating_add(1);
        *quantity
    }

    /// Removes one unit of `course_id`.
    ///
    /// Returns the remaining quantity, or `None` when the course was not in
    /// the cart. A remaining quantity of zero means the key was dropped.
    pub fn remove(&mut self, course_id: CourseId) -> Option<u32> {
        let quantity = self.0.get_mut(&course_id)?;
        if *quantity <= 1 {
            self.0.remove(&course_id);
            return Some(0);
        }
        *quantity -= 1;
        Some(*quantity)
    }

    pub fn quantity(&self, course_id: CourseId) -> u32 {
        self.0.get(&course_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CourseId, &u32)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Deserialize, validator::Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub item_id: CourseId,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    /// Course id to quantity
    #[schema(value_type = Object)]
    pub cart_data: CartData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_increments() {
        let mut cart = CartData::new();
        let course = CourseId::new();
        assert_eq!(cart.add(course), 1);
        assert_eq!(cart.add(course), 2);
        assert_eq!(cart.quantity(course), 2);
    }

    #[test]
    fn test_remove_decrements_then_drops_key() {
        let mut cart = CartData::new();
        let course = CourseId::new();
        cart.add(course);
        cart.add(course);

        assert_eq!(cart.remove(course), Some(1));
        assert_eq!(cart.remove(course), Some(0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_course() {
        let mut cart = CartData::new();
        assert_eq!(cart.remove(CourseId::new()), None);
    }

    #[test]
    fn test_add_then_remove_restores_previous_cart() {
        let kept = CourseId::new();
        let mut cart = CartData::new();
        cart.add(kept);
        let before = cart.clone();

        let added = CourseId::new();
        cart.add(added);
        cart.remove(added);
        assert_eq!(cart, before);

        cart.add(kept);
        cart.remove(kept);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let course = CourseId::new();
        let mut cart = CartData::new();
        cart.add(course);

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json, serde_json::json!({ course.to_string(): 1 }));
    }
}
