//! In-memory store backing all three repositories.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use quire_core::domain::{Category, Page, Post, PostFields, Tag};
use quire_core::error::RepoError;
use quire_core::ports::{BaseRepository, CategoryRepository, PostRepository, TagRepository};

#[derive(Default)]
struct Tables {
    posts: BTreeMap<i64, Post>,
    categories: BTreeMap<i64, Category>,
    tags: BTreeMap<i64, Tag>,
    last_post_id: i64,
}

impl Tables {
    fn slug_in_use(&self, slug: &str, ignore: Option<i64>) -> bool {
        self.posts
            .values()
            .any(|p| p.slug == slug && Some(p.id) != ignore)
    }
}

/// Posts, categories and tags held in ordered maps behind an async RwLock.
///
/// Enforces the same slug uniqueness as the database's unique index.
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed categories. Categories are managed outside this service.
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        let tables = self.tables.get_mut();
        for category in categories {
            tables.categories.insert(category.id, category);
        }
        self
    }

    /// Seed tags. Tags are managed outside this service.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        let tables = self.tables.get_mut();
        for tag in tags {
            tables.tags.insert(tag.id, tag);
        }
        self
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.tables.read().await.posts.values().cloned().collect())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn paginate(
        &self,
        owner: Option<i64>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        let matching: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| owner.is_none_or(|user_id| p.user_id == user_id))
            .collect();

        let total = matching.len() as u64;
        let skip = page.saturating_sub(1).saturating_mul(per_page);
        let items = matching
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(per_page).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(Page::new(items, page, per_page, total))
    }

    async fn slug_taken(&self, slug: &str, ignore: Option<i64>) -> Result<bool, RepoError> {
        Ok(self.tables.read().await.slug_in_use(slug, ignore))
    }

    async fn create(&self, user_id: i64, fields: PostFields) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.slug_in_use(&fields.slug, None) {
            return Err(RepoError::Constraint(format!(
                "duplicate slug \"{}\"",
                fields.slug
            )));
        }

        tables.last_post_id += 1;
        let post = Post::new(tables.last_post_id, user_id, fields);
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, id: i64, fields: PostFields) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.slug_in_use(&fields.slug, Some(id)) {
            return Err(RepoError::Constraint(format!(
                "duplicate slug \"{}\"",
                fields.slug
            )));
        }

        let post = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.apply(fields);
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl BaseRepository<Category, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<Category>, RepoError> {
        Ok(self.tables.read().await.categories.values().cloned().collect())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {}

#[async_trait]
impl BaseRepository<Tag, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Tag>, RepoError> {
        Ok(self.tables.read().await.tags.get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<Tag>, RepoError> {
        Ok(self.tables.read().await.tags.values().cloned().collect())
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn existing_ids(&self, ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| tables.tags.contains_key(id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(slug: &str) -> PostFields {
        PostFields {
            title: "Hello".to_string(),
            slug: slug.to_string(),
            category_id: 1,
            creator: "Bob".to_string(),
            description: "x".to_string(),
            image: None,
            date_creation: "2020-01-01".to_string(),
            tag_ids: BTreeSet::from([1]),
        }
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = InMemoryStore::new();

        let first = store.create(5, fields("a")).await.unwrap();
        store.delete(first.id).await.unwrap();
        let second = store.create(5, fields("b")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_a_constraint_violation() {
        let store = InMemoryStore::new();
        let first = store.create(5, fields("hello")).await.unwrap();

        let dup = store.create(7, fields("hello")).await;
        assert!(matches!(dup, Err(RepoError::Constraint(_))));

        // Re-saving a post under its own slug is fine.
        assert!(store.update(first.id, fields("hello")).await.is_ok());
    }

    #[tokio::test]
    async fn test_paginate_filters_by_owner() {
        let store = InMemoryStore::new();
        for i in 0..35 {
            let owner = if i % 2 == 0 { 5 } else { 7 };
            store.create(owner, fields(&format!("post-{i}"))).await.unwrap();
        }

        let all = store.paginate(None, 2, 30).await.unwrap();
        assert_eq!(all.total, 35);
        assert_eq!(all.items.len(), 5);
        assert_eq!(all.items[0].id, 31);

        let mine = store.paginate(Some(5), 1, 30).await.unwrap();
        assert_eq!(mine.total, 18);
        assert!(mine.items.iter().all(|p| p.user_id == 5));
    }

    #[tokio::test]
    async fn test_existing_ids_filters_unknown_tags() {
        let store = InMemoryStore::new().with_tags([
            Tag {
                id: 1,
                name: "rust".to_string(),
            },
            Tag {
                id: 2,
                name: "web".to_string(),
            },
        ]);

        let known = store
            .existing_ids(&BTreeSet::from([1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(known, BTreeSet::from([1, 2]));
    }
}
