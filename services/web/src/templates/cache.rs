//! services/web/src/templates/cache.rs
//!
//! Memoizes template sources by name for the lifetime of the server.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{render, TemplateError};

/// Name-to-content cache over a template directory.
///
/// With `reload_on_every_access` unset, each name is read from disk at most
/// once per cache. With it set, every access re-reads the file and overwrites
/// the stored entry. Failed reads are never cached.
#[derive(Debug)]
pub struct TemplateCache {
    root: PathBuf,
    reload_on_every_access: bool,
    entries: RwLock<HashMap<String, Arc<str>>>,
}

impl TemplateCache {
    pub fn new(root: impl Into<PathBuf>, reload_on_every_access: bool) -> Self {
        Self {
            root: root.into(),
            reload_on_every_access,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the content of template `name`, loading it if needed.
    pub async fn get(&self, name: &str) -> Result<Arc<str>, TemplateError> {
        if !self.reload_on_every_access {
            if let Some(content) = self.entries.read().await.get(name) {
                return Ok(content.clone());
            }
        }

        // Holding the write lock across the read keeps concurrent first
        // accesses from loading the same file twice.
        let mut entries = self.entries.write().await;
        if !self.reload_on_every_access {
            if let Some(content) = entries.get(name) {
                return Ok(content.clone());
            }
        }

        let content: Arc<str> = self.load(name).await?.into();
        entries.insert(name.to_string(), content.clone());
        Ok(content)
    }

    /// Renders template `name` with `partials` given as `(tag name, template name)` pairs.
    pub async fn render(
        &self,
        name: &str,
        context: &Value,
        partials: &[(&str, &str)],
    ) -> Result<String, TemplateError> {
        let template = self.get(name).await?;
        let mut loaded = HashMap::with_capacity(partials.len());
        for (tag, template_name) in partials {
            loaded.insert(tag.to_string(), self.get(template_name).await?);
        }
        render(&template, context, &loaded)
    }

    async fn load(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.root.join(name);
        debug!("Loading template {} from {:?}", name, path);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| TemplateError::Load(name.to_string(), e.to_string()))
    }
}
