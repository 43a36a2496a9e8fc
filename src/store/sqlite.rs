use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{debug, info};

use super::LinkStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{Link, NewLink};
use crate::schema;

pub type ConnectionPool = Arc<Mutex<Connection>>;

pub struct SqliteStore {
    pool: ConnectionPool,
}

impl SqliteStore {
    pub fn open(database_url: &str) -> StoreResult<SqliteStore> {
        let conn = Connection::open(database_url)?;
        schema::migrate(&conn)?;

        info!("Opened SQLite link store at {}", database_url);

        Ok(SqliteStore {
            pool: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> StoreResult<SqliteStore> {
        Self::open(":memory:")
    }

    /// Runs `f` on the blocking pool with the connection held for its
    /// whole duration. The guard is dropped on every exit path.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))?;
            f(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl LinkStore for SqliteStore {
    async fn list_all(&self) -> StoreResult<Vec<Link>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, url, created_at, views, clicks FROM links ORDER BY id",
            )?;
            let links = stmt
                .query_map([], Link::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(links)
        })
        .await
    }

    async fn create(&self, title: &str, url: &str) -> StoreResult<()> {
        let link = NewLink::new(title, url).map_err(StoreError::ConstraintViolation)?;
        let (title, url) = (link.title.to_owned(), link.url.to_owned());

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO links (title, url, created_at, views, clicks) VALUES (?1, ?2, ?3, 0, 0)",
                params![title, url, Utc::now()],
            )?;
            debug!("Inserted link {} -> {}", conn.last_insert_rowid(), url);
            Ok(())
        })
        .await
    }

    async fn update(&self, id: i64, title: &str, url: &str) -> StoreResult<()> {
        let link = NewLink::new(title, url).map_err(StoreError::ConstraintViolation)?;
        let (title, url) = (link.title.to_owned(), link.url.to_owned());

        self.with_conn(move |conn| {
            let updated = conn.execute(
                "UPDATE links SET title = ?1, url = ?2 WHERE id = ?3",
                params![title, url, id],
            )?;
            debug!("Updated link {} ({} rows)", id, updated);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.with_conn(move |conn| {
            let deleted = conn.execute("DELETE FROM links WHERE id = ?1", params![id])?;
            debug!("Deleted link {} ({} rows)", id, deleted);
            Ok(())
        })
        .await
    }

    async fn record_public_view(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE links SET views = views + 1", [])?;
            Ok(())
        })
        .await
    }

    async fn record_click(&self, id: i64) -> StoreResult<String> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let updated = tx.execute(
                "UPDATE links SET clicks = clicks + 1 WHERE id = ?1",
                params![id],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(id));
            }

            let url: String =
                tx.query_row("SELECT url FROM links WHERE id = ?1", params![id], |row| {
                    row.get(0)
                })?;
            tx.commit()?;

            Ok(url)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
