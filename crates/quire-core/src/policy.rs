//! Ownership rules for posts.

use crate::domain::Post;
use crate::error::DomainError;

/// Role allowed to review every post.
pub const ADMIN_ROLE: &str = "admin";

/// Only the owner may edit, update or delete a post.
pub fn can_modify(user_id: i64, post: &Post) -> bool {
    post.is_owned_by(user_id)
}

pub fn ensure_can_modify(user_id: i64, post: &Post) -> Result<(), DomainError> {
    if can_modify(user_id, post) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

pub fn can_list_all(roles: &[String]) -> bool {
    roles.iter().any(|r| r == ADMIN_ROLE)
}
