//! Quest Catalog
//!
//! Immutable id-keyed store of compiled quests. A catalog is never edited
//! after it is built; reloading produces a new one.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::data::{DocumentStore, QuestDocuments};

use super::definition::QuestDefinition;
use super::error::CatalogError;

#[derive(Debug, Clone, Default)]
pub struct QuestCatalog {
    quests: HashMap<u16, Arc<QuestDefinition>>,
}

impl QuestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later definitions replace earlier ones with the same id
    pub fn from_definitions(definitions: impl IntoIterator<Item = QuestDefinition>) -> Self {
        let mut quests = HashMap::new();
        for quest in definitions {
            let id = quest.id();
            if quests.insert(id, Arc::new(quest)).is_some() {
                warn!("Duplicate quest ID {}, overwriting", id);
            }
        }
        Self { quests }
    }

    /// Build from the quest documents of a store; any failing quest aborts the build
    pub fn load(store: &DocumentStore) -> Result<Self, CatalogError> {
        let documents = QuestDocuments::read(store)?;
        let catalog = Self::from_definitions(documents.compile()?);
        info!("Loaded {} quest definitions", catalog.len());
        Ok(catalog)
    }

    pub fn load_from_directory(data_dir: &Path) -> Result<Self, CatalogError> {
        info!("Loading quests from {:?}", data_dir);
        let store = DocumentStore::open(data_dir)?;
        Self::load(&store)
    }

    pub fn get(&self, id: u16) -> Option<Arc<QuestDefinition>> {
        self.quests.get(&id).cloned()
    }

    pub fn contains(&self, id: u16) -> bool {
        self.quests.contains_key(&id)
    }

    /// Quest ids in ascending order
    pub fn ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.quests.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<QuestDefinition>> {
        self.quests.values()
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Ids of quests tracking kills of `monster_id`, ascending
    pub fn quests_for_monster(&self, monster_id: u32) -> Vec<u16> {
        let mut ids: Vec<u16> = self
            .quests
            .values()
            .filter(|q| q.tracks_monster(monster_id))
            .map(|q| q.id())
            .collect();
        ids.sort_unstable();
        ids
    }
}
