use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::LinkStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{Link, NewLink};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    next_id: i64,
    #[serde(default)]
    links: Vec<Link>,
}

/// Accepts both the current document layout and a bare array of links.
#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Document(Document),
    Links(Vec<Link>),
}

impl Document {
    fn allocate_id(&mut self) -> i64 {
        let highest = self.links.iter().map(|link| link.id).max().unwrap_or(0);
        let id = self.next_id.max(highest + 1);
        self.next_id = id + 1;
        id
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut Link> {
        self.links.iter_mut().find(|link| link.id == id)
    }
}

struct Inner {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Inner {
    fn load(&self) -> StoreResult<Document> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::default()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Document::default());
        }

        Ok(match serde_json::from_str::<OnDisk>(&content)? {
            OnDisk::Document(doc) => doc,
            OnDisk::Links(links) => Document { next_id: 0, links },
        })
    }

    fn save(&self, doc: &Document) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Link store backed by a single JSON document. Every operation loads,
/// edits and rewrites the whole file under one lock.
pub struct FileStore {
    inner: Arc<Inner>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<FileStore> {
        let inner = Inner {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };

        let doc = inner.load()?;
        if !inner.path.exists() {
            inner.save(&doc)?;
            info!("Created empty link file {}", inner.path.display());
        }
        info!(
            "Opened file link store at {} ({} links)",
            inner.path.display(),
            doc.links.len()
        );

        Ok(FileStore {
            inner: Arc::new(inner),
        })
    }

    async fn read<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Document) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = inner
                .lock
                .lock()
                .map_err(|_| StoreError::Unavailable("link file lock poisoned".into()))?;
            f(&inner.load()?)
        })
        .await?
    }

    /// The document is written back only when `f` succeeds.
    async fn modify<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Document) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = inner
                .lock
                .lock()
                .map_err(|_| StoreError::Unavailable("link file lock poisoned".into()))?;
            let mut doc = inner.load()?;
            let value = f(&mut doc)?;
            inner.save(&doc)?;
            Ok(value)
        })
        .await?
    }
}

#[async_trait]
impl LinkStore for FileStore {
    async fn list_all(&self) -> StoreResult<Vec<Link>> {
        self.read(|doc| {
            let mut links = doc.links.clone();
            links.sort_by_key(|link| link.id);
            Ok(links)
        })
        .await
    }

    async fn create(&self, title: &str, url: &str) -> StoreResult<()> {
        let link = NewLink::new(title, url).map_err(StoreError::ConstraintViolation)?;
        let (title, url) = (link.title.to_owned(), link.url.to_owned());

        self.modify(move |doc| {
            let id = doc.allocate_id();
            debug!("Inserted link {} -> {}", id, url);
            doc.links.push(Link {
                id,
                title,
                url,
                created_at: Utc::now(),
                views: 0,
                clicks: 0,
            });
            Ok(())
        })
        .await
    }

    async fn update(&self, id: i64, title: &str, url: &str) -> StoreResult<()> {
        let link = NewLink::new(title, url).map_err(StoreError::ConstraintViolation)?;
        let (title, url) = (link.title.to_owned(), link.url.to_owned());

        self.modify(move |doc| {
            match doc.find_mut(id) {
                Some(link) => {
                    link.title = title;
                    link.url = url;
                }
                None => debug!("Update skipped, link {} does not exist", id),
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.modify(move |doc| {
            doc.links.retain(|link| link.id != id);
            Ok(())
        })
        .await
    }

    async fn record_public_view(&self) -> StoreResult<()> {
        self.modify(|doc| {
            for link in doc.links.iter_mut() {
                link.views += 1;
            }
            Ok(())
        })
        .await
    }

    async fn record_click(&self, id: i64) -> StoreResult<String> {
        self.modify(move |doc| {
            let link = doc.find_mut(id).ok_or(StoreError::NotFound(id))?;
            link.clicks += 1;
            Ok(link.url.clone())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
