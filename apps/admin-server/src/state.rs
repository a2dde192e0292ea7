//! Application state - shared across all handlers.

use std::sync::Arc;

use quire_core::PostService;
use quire_core::domain::Category;
use quire_infra::{DatabaseConfig, InMemoryStore};

#[cfg(feature = "postgres")]
use quire_infra::DatabaseConnections;
#[cfg(feature = "postgres")]
use quire_infra::database::{
    PostgresCategoryRepository, PostgresPostRepository, PostgresTagRepository,
};

use crate::views::Views;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub views: Arc<Views>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// Falls back to an in-memory store when no database is configured or
    /// the connection fails.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Result<Self, minijinja::Error> {
        #[cfg(feature = "postgres")]
        match db_config {
            Some(config) => match DatabaseConnections::init(config).await {
                Ok(connections) => {
                    let db = connections.main;
                    let posts = PostService::new(
                        Arc::new(PostgresPostRepository::new(Arc::clone(&db))),
                        Arc::new(PostgresCategoryRepository::new(Arc::clone(&db))),
                        Arc::new(PostgresTagRepository::new(db)),
                    );
                    tracing::info!("Application state initialized");
                    return Ok(Self {
                        posts,
                        views: Arc::new(Views::new()?),
                    });
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        {
            if db_config.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            tracing::info!("Running without postgres feature - using in-memory store");
        }

        let state = Self::in_memory(fallback_store())?;
        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// State over an existing in-memory store.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Result<Self, minijinja::Error> {
        Ok(Self {
            posts: in_memory_service(store),
            views: Arc::new(Views::new()?),
        })
    }
}

fn in_memory_service(store: Arc<InMemoryStore>) -> PostService {
    PostService::new(store.clone(), store.clone(), store)
}

/// Categories live outside this service; seed one so posts can be created.
/// Note: Data is lost on process restart.
fn fallback_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new().with_categories([Category {
        id: 1,
        name: "General".to_string(),
    }]))
}
