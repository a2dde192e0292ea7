use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{Category, Page, Post, PostFields, Tag};
use crate::error::RepoError;

/// Read operations shared by every repository.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Every stored entity, ordered by ID.
    async fn all(&self) -> Result<Vec<T>, RepoError>;
}

/// Category lookups. Categories are read-only here.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, i64> {
    async fn exists(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

/// Tag lookups. Tags are read-only here.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag, i64> {
    /// The subset of `ids` naming an existing tag.
    async fn existing_ids(&self, ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>, RepoError>;
}

/// Post persistence, including the post/tag association table.
///
/// Posts returned from any method carry their full tag id set.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    /// One page of posts ordered by id, optionally restricted to one owner.
    async fn paginate(
        &self,
        owner: Option<i64>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Post>, RepoError>;

    /// Whether another post already uses `slug`. `ignore` excludes one post id.
    async fn slug_taken(&self, slug: &str, ignore: Option<i64>) -> Result<bool, RepoError>;

    /// Insert a post owned by `user_id` and attach its tags, atomically.
    ///
    /// A slug collision surfaces as [`RepoError::Constraint`].
    async fn create(&self, user_id: i64, fields: PostFields) -> Result<Post, RepoError>;

    /// Overwrite a post's fields and reconcile its tag set, atomically.
    async fn update(&self, id: i64, fields: PostFields) -> Result<Post, RepoError>;

    /// Detach every tag, then remove the post. [`RepoError::NotFound`] if absent.
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}
