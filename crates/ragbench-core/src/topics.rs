//! File-backed category hierarchy.
//!
//! The catalog is a JSON array of `{ "id", "name", "parent_id" }` rows. A
//! topic's path is the chain of names from the root down to the topic,
//! joined with `" > "`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::traits::TopicSource;
use crate::types::{Topic, TopicId};

pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: TopicId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<TopicId>,
}

#[derive(Debug, Default)]
pub struct CategoryTree {
    by_id: HashMap<TopicId, Category>,
}

impl CategoryTree {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self { by_id: categories.into_iter().map(|c| (c.id, c)).collect() }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
        let categories: Vec<Category> = serde_json::from_str(&raw)
            .map_err(|source| Error::Parse { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), categories = categories.len(), "loaded category tree");
        Ok(Self::new(categories))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: TopicId) -> Result<&Category> {
        self.by_id.get(&id).ok_or(Error::TopicNotFound(id))
    }

    /// Names from the root category down to `id`.
    pub fn ancestry(&self, id: TopicId) -> Result<Vec<&str>> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if !seen.insert(current) {
                return Err(Error::CategoryCycle(current));
            }
            let category = self.get(current)?;
            names.push(category.name.as_str());
            cursor = category.parent_id;
        }
        names.reverse();
        Ok(names)
    }

    pub fn path(&self, id: TopicId) -> Result<String> {
        Ok(self.ancestry(id)?.join(PATH_SEPARATOR))
    }
}

impl TopicSource for CategoryTree {
    fn topic(&self, id: TopicId) -> anyhow::Result<Topic> {
        let category = self.get(id)?;
        Ok(Topic { id, name: category.name.clone(), path: self.path(id)? })
    }

    fn topic_path(&self, id: TopicId) -> anyhow::Result<String> {
        Ok(self.path(id)?)
    }
}

/// Stands in for a catalog that could not be loaded: every lookup fails with
/// the load error, so each topic of a run becomes a row of failure records.
#[derive(Debug, Clone)]
pub struct UnavailableTopics {
    reason: String,
}

impl UnavailableTopics {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl TopicSource for UnavailableTopics {
    fn topic(&self, id: TopicId) -> anyhow::Result<Topic> {
        anyhow::bail!("topic {id} unavailable: {}", self.reason)
    }

    fn topic_path(&self, id: TopicId) -> anyhow::Result<String> {
        anyhow::bail!("topic {id} unavailable: {}", self.reason)
    }
}
