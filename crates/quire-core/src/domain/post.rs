use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validated post attributes a client is allowed to set.
///
/// Produced by [`crate::PostService`] once a [`crate::PostInput`] passed every
/// rule; repositories only ever persist this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFields {
    pub title: String,
    pub slug: String,
    pub category_id: i64,
    pub creator: String,
    pub description: String,
    pub image: Option<String>,
    pub date_creation: String,
    pub tag_ids: BTreeSet<i64>,
}

/// Post entity - a blog post owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub slug: String,
    pub creator: String,
    pub description: String,
    pub image: Option<String>,
    pub date_creation: String,
    pub tag_ids: BTreeSet<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a post owned by `user_id`.
    pub fn new(id: i64, user_id: i64, fields: PostFields) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            category_id: fields.category_id,
            title: fields.title,
            slug: fields.slug,
            creator: fields.creator,
            description: fields.description,
            image: fields.image,
            date_creation: fields.date_creation,
            tag_ids: fields.tag_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every client-settable attribute. Id, owner and creation time stay.
    pub fn apply(&mut self, fields: PostFields) {
        self.category_id = fields.category_id;
        self.title = fields.title;
        self.slug = fields.slug;
        self.creator = fields.creator;
        self.description = fields.description;
        self.image = fields.image;
        self.date_creation = fields.date_creation;
        self.tag_ids = fields.tag_ids;
        self.updated_at = Utc::now();
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(slug: &str, tags: &[i64]) -> PostFields {
        PostFields {
            title: "Hello".to_string(),
            slug: slug.to_string(),
            category_id: 1,
            creator: "Bob".to_string(),
            description: "x".to_string(),
            image: None,
            date_creation: "2020-01-01".to_string(),
            tag_ids: tags.iter().copied().collect(),
        }
    }

    #[test]
    fn test_apply_keeps_identity_and_owner() {
        let mut post = Post::new(3, 5, fields("hello", &[1, 2]));
        let created_at = post.created_at;

        post.apply(fields("hello-again", &[3]));

        assert_eq!(post.id, 3);
        assert_eq!(post.user_id, 5);
        assert_eq!(post.created_at, created_at);
        assert_eq!(post.slug, "hello-again");
        assert_eq!(post.tag_ids, BTreeSet::from([3]));
        assert!(post.updated_at >= created_at);
    }

    #[test]
    fn test_ownership() {
        let post = Post::new(1, 5, fields("hello", &[]));
        assert!(post.is_owned_by(5));
        assert!(!post.is_owned_by(7));
    }
}
