//! Post operations: listing, creation, display, update and deletion.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{Category, Page, Post, PostFields, Tag};
use crate::error::{DomainError, RepoError};
use crate::policy;
use crate::ports::{CategoryRepository, PostRepository, TagRepository};
use crate::validation::{FieldErrors, PostInput};

/// Posts shown per listing page.
pub const PER_PAGE: u64 = 30;

const SLUG_TAKEN: &str = "The slug has already been taken.";
const CATEGORY_INVALID: &str = "The selected category id is invalid.";
const TAGS_INVALID: &str = "The selected tags is invalid.";

/// Everything a post form offers to choose from.
#[derive(Debug, Clone, Serialize)]
pub struct FormOptions {
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

/// A post together with the full category and tag listings.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

impl PostDetail {
    fn new(post: Post, options: FormOptions) -> Self {
        Self {
            post,
            categories: options.categories,
            tags: options.tags,
        }
    }
}

/// Drives every post operation against the repositories.
///
/// Each operation that targets one post resolves it first (not found),
/// then checks ownership where required (forbidden), then validates, and
/// only then writes.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        tags: Arc<dyn TagRepository>,
    ) -> Self {
        Self {
            posts,
            categories,
            tags,
        }
    }

    pub async fn list_all(&self, page: u64) -> Result<Page<Post>, DomainError> {
        Ok(self.posts.paginate(None, page.max(1), PER_PAGE).await?)
    }

    pub async fn list_owned_by(&self, user_id: i64, page: u64) -> Result<Page<Post>, DomainError> {
        Ok(self
            .posts
            .paginate(Some(user_id), page.max(1), PER_PAGE)
            .await?)
    }

    pub async fn form_options(&self) -> Result<FormOptions, DomainError> {
        let categories = self.categories.all().await?;
        let tags = self.tags.all().await?;
        Ok(FormOptions { categories, tags })
    }

    /// Validate and persist a new post owned by `user_id`.
    pub async fn store(&self, user_id: i64, input: PostInput) -> Result<Post, DomainError> {
        let fields = self.validate(input, None).await?;
        self.posts
            .create(user_id, fields)
            .await
            .map_err(slug_conflict)
    }

    /// Detail view data. Viewing is not restricted to the owner.
    pub async fn show(&self, id: i64) -> Result<PostDetail, DomainError> {
        let post = self.find_or_fail(id).await?;
        let options = self.form_options().await?;
        Ok(PostDetail::new(post, options))
    }

    pub async fn edit(&self, user_id: i64, id: i64) -> Result<PostDetail, DomainError> {
        let post = self.find_or_fail(id).await?;
        policy::ensure_can_modify(user_id, &post)?;
        let options = self.form_options().await?;
        Ok(PostDetail::new(post, options))
    }

    /// Overwrite a post's fields and replace its tag set.
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        let post = self.find_or_fail(id).await?;
        policy::ensure_can_modify(user_id, &post)?;
        let fields = self.validate(input, Some(post.id)).await?;

        self.posts
            .update(post.id, fields)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => not_found(id),
                other => slug_conflict(other),
            })
    }

    /// Detach the post's tags and delete it.
    pub async fn destroy(&self, user_id: i64, id: i64) -> Result<(), DomainError> {
        let post = self.find_or_fail(id).await?;
        policy::ensure_can_modify(user_id, &post)?;

        self.posts.delete(post.id).await.map_err(|e| match e {
            RepoError::NotFound => not_found(id),
            other => other.into(),
        })
    }

    /// Apply the static field rules, then the store-backed ones.
    ///
    /// `ignore` is the id of the post being updated, whose own slug does not
    /// count as taken.
    pub async fn validate(
        &self,
        input: PostInput,
        ignore: Option<i64>,
    ) -> Result<PostFields, DomainError> {
        let input = input.normalized();
        let mut errors = input.check();

        if !errors.has("slug") && self.posts.slug_taken(&input.slug, ignore).await? {
            errors.add("slug", SLUG_TAKEN);
        }

        if let Some(category_id) = input.category_id {
            if !self.categories.exists(category_id).await? {
                errors.add("category_id", CATEGORY_INVALID);
            }
        }

        let submitted = input.tag_set();
        if !submitted.is_empty() {
            let known = self.tags.existing_ids(&submitted).await?;
            if known.len() != submitted.len() {
                errors.add("tags", TAGS_INVALID);
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        input
            .into_fields()
            .ok_or_else(|| DomainError::Internal("category id missing after validation".into()))
    }

    async fn find_or_fail(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i64) -> DomainError {
    DomainError::NotFound {
        entity_type: "Post",
        id,
    }
}

/// A unique-index violation on write means another request took the slug first.
fn slug_conflict(err: RepoError) -> DomainError {
    match err {
        RepoError::Constraint(_) => {
            let mut errors = FieldErrors::new();
            errors.add("slug", SLUG_TAKEN);
            DomainError::Validation(errors)
        }
        other => other.into(),
    }
}
