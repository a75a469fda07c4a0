use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use super::SeenStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct FoundUrls {
    #[serde(default)]
    urls: Vec<UrlEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UrlEntry {
    title: String,
    url: String,
}

#[derive(Debug, Default)]
struct State {
    doc: FoundUrls,
    keys: HashSet<String>,
}

/// `found-url.json` backed store. The document is read once on open and
/// rewritten (temp file + rename) after every insert.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: Mutex<State>,
}

impl JsonFileStore {
    /// Missing or empty file opens as an empty store; a corrupt one is an error.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = match fs::read_to_string(&path).await {
            Ok(s) if s.trim().is_empty() => FoundUrls::default(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FoundUrls::default(),
            Err(e) => return Err(e.into()),
        };

        let mut keys = HashSet::with_capacity(doc.urls.len() * 2);
        for e in &doc.urls {
            keys.insert(e.url.clone());
            keys.insert(e.title.clone());
        }
        tracing::info!(path = %path.display(), records = doc.urls.len(), "seen store opened");

        Ok(Self {
            path,
            inner: Mutex::new(State { doc, keys }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.doc.urls.len()
    }

    async fn persist(&self, doc: &FoundUrls) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(doc)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SeenStore for JsonFileStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.keys.contains(key))
    }

    async fn insert(&self, identifier: &str, title: &str) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        state.doc.urls.push(UrlEntry {
            title: title.to_string(),
            url: identifier.to_string(),
        });
        state.keys.insert(identifier.to_string());
        state.keys.insert(title.to_string());
        self.persist(&state.doc).await
    }
}
