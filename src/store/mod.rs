use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Backend, Config};
use crate::error::StoreResult;
use crate::models::Link;

pub mod file;
pub mod sqlite;

pub use self::file::FileStore;
pub use self::sqlite::SqliteStore;

/// Persistent set of link records.
///
/// Counter updates are applied by the store itself so that concurrent
/// requests never lose an increment.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// All links in creation order.
    async fn list_all(&self) -> StoreResult<Vec<Link>>;

    /// Inserts a link with zeroed counters.
    async fn create(&self, title: &str, url: &str) -> StoreResult<()>;

    /// Replaces title and url. Unknown ids are ignored.
    async fn update(&self, id: i64, title: &str, url: &str) -> StoreResult<()>;

    /// Unknown ids are ignored.
    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Adds one view to every link.
    async fn record_public_view(&self) -> StoreResult<()>;

    /// Adds one click to the link and returns its target url.
    async fn record_click(&self, id: i64) -> StoreResult<String>;

    fn backend_name(&self) -> &'static str;
}

pub fn open_store(config: &Config) -> StoreResult<Arc<dyn LinkStore>> {
    let store: Arc<dyn LinkStore> = match config.backend {
        Backend::Sqlite => Arc::new(SqliteStore::open(&config.database_url)?),
        Backend::File => Arc::new(FileStore::open(&config.database_url)?),
    };

    Ok(store)
}
