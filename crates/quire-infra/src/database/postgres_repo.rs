//! PostgreSQL repository implementations.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbConn, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use quire_core::domain::{Page, Post, PostFields, TagSync};
use quire_core::error::RepoError;
use quire_core::ports::{BaseRepository, CategoryRepository, PostRepository, TagRepository};

use super::entity::category::Entity as CategoryEntity;
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn existing_ids(&self, ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>, RepoError> {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let found: Vec<i64> = TagEntity::find()
            .select_only()
            .column(tag::Column::Id)
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(found.into_iter().collect())
    }
}

/// PostgreSQL post repository. Keeps `post_tag` in step with every write.
pub struct PostgresPostRepository {
    db: Arc<DbConn>,
}

impl PostgresPostRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for PostgresPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let mut tags = tag_ids_for(self.db.as_ref(), vec![model.id]).await?;
        let tag_ids = tags.remove(&model.id).unwrap_or_default();
        Ok(Some(into_domain(model, tag_ids)))
    }

    async fn all(&self) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .order_by_asc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        with_tags(self.db.as_ref(), models).await
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn paginate(
        &self,
        owner: Option<i64>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Post>, RepoError> {
        let mut query = PostEntity::find().order_by_asc(post::Column::Id);
        if let Some(user_id) = owner {
            query = query.filter(post::Column::UserId.eq(user_id));
        }

        let paginator = query.paginate(self.db.as_ref(), per_page);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(map_db_err)?;

        let items = with_tags(self.db.as_ref(), models).await?;
        Ok(Page::new(items, page, per_page, total))
    }

    async fn slug_taken(&self, slug: &str, ignore: Option<i64>) -> Result<bool, RepoError> {
        let mut query = PostEntity::find().filter(post::Column::Slug.eq(slug));
        if let Some(id) = ignore {
            query = query.filter(post::Column::Id.ne(id));
        }

        let count = query.count(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(count > 0)
    }

    async fn create(&self, user_id: i64, fields: PostFields) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let now = Utc::now();

        let mut active = post::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        set_fields(&mut active, &fields);

        let model = active.insert(&txn).await.map_err(map_db_err)?;
        let tag_ids: Vec<i64> = fields.tag_ids.iter().copied().collect();
        attach(&txn, model.id, &tag_ids).await?;

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(post_id = model.id, tags = tag_ids.len(), "Inserted post");

        Ok(into_domain(model, fields.tag_ids))
    }

    async fn update(&self, id: i64, fields: PostFields) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let existing = PostEntity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;
        let current = tag_ids_for(&txn, vec![id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        let plan = TagSync::plan(&current, &fields.tag_ids);

        let mut active: post::ActiveModel = existing.into();
        set_fields(&mut active, &fields);
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&txn).await.map_err(map_db_err)?;

        if !plan.is_noop() {
            detach(&txn, id, &plan.detach).await?;
            attach(&txn, id, &plan.attach).await?;
        }

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(
            post_id = id,
            attached = plan.attach.len(),
            detached = plan.detach.len(),
            "Updated post"
        );

        Ok(into_domain(model, fields.tag_ids))
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let result = PostEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        // Dropping the transaction rolls the detach back.
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}

fn set_fields(active: &mut post::ActiveModel, fields: &PostFields) {
    active.category_id = Set(fields.category_id);
    active.title = Set(fields.title.clone());
    active.slug = Set(fields.slug.clone());
    active.creator = Set(fields.creator.clone());
    active.description = Set(fields.description.clone());
    active.image = Set(fields.image.clone());
    active.date_creation = Set(fields.date_creation.clone());
}

fn into_domain(model: post::Model, tag_ids: BTreeSet<i64>) -> Post {
    let mut post: Post = model.into();
    post.tag_ids = tag_ids;
    post
}

async fn with_tags<C>(conn: &C, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError>
where
    C: ConnectionTrait,
{
    let mut tags = tag_ids_for(conn, models.iter().map(|m| m.id).collect()).await?;

    Ok(models
        .into_iter()
        .map(|model| {
            let tag_ids = tags.remove(&model.id).unwrap_or_default();
            into_domain(model, tag_ids)
        })
        .collect())
}

/// Tag ids per post, for the given posts.
async fn tag_ids_for<C>(
    conn: &C,
    post_ids: Vec<i64>,
) -> Result<HashMap<i64, BTreeSet<i64>>, RepoError>
where
    C: ConnectionTrait,
{
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = PostTagEntity::find()
        .filter(post_tag::Column::PostId.is_in(post_ids))
        .all(conn)
        .await
        .map_err(map_db_err)?;

    let mut by_post: HashMap<i64, BTreeSet<i64>> = HashMap::new();
    for link in links {
        by_post.entry(link.post_id).or_default().insert(link.tag_id);
    }
    Ok(by_post)
}

async fn attach<C>(conn: &C, post_id: i64, tag_ids: &[i64]) -> Result<(), RepoError>
where
    C: ConnectionTrait,
{
    if tag_ids.is_empty() {
        return Ok(());
    }

    let links = tag_ids.iter().map(|&tag_id| post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(tag_id),
    });

    PostTagEntity::insert_many(links)
        .exec_without_returning(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

async fn detach<C>(conn: &C, post_id: i64, tag_ids: &[i64]) -> Result<(), RepoError>
where
    C: ConnectionTrait,
{
    if tag_ids.is_empty() {
        return Ok(());
    }

    PostTagEntity::delete_many()
        .filter(post_tag::Column::PostId.eq(post_id))
        .filter(post_tag::Column::TagId.is_in(tag_ids.iter().copied()))
        .exec(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}
