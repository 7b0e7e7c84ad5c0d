//! Quest Registry
//!
//! Shared entry point for quest lookups and requirement evaluation. Holds the
//! current catalog and swaps in rebuilt ones, optionally on file changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::provider::CharacterContext;

use super::catalog::QuestCatalog;
use super::definition::{Phase, QuestDefinition};
use super::error::{CatalogError, LookupError};
use super::requirement::RequirementKind;

/// Registry over the current quest catalog
pub struct QuestRegistry {
    catalog: RwLock<Arc<QuestCatalog>>,
    /// Held for a whole rebuild so reloads read and publish in order
    reload_lock: Mutex<()>,
}

impl QuestRegistry {
    pub fn new(catalog: QuestCatalog) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            reload_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the current catalog; the lock is released on return
    pub async fn catalog(&self) -> Arc<QuestCatalog> {
        self.catalog.read().await.clone()
    }

    pub async fn lookup(&self, quest_id: u16) -> Result<Arc<QuestDefinition>, LookupError> {
        self.catalog()
            .await
            .get(quest_id)
            .ok_or(LookupError::QuestNotFound(quest_id))
    }

    /// Check a single requirement of a quest phase
    pub async fn evaluate(
        &self,
        quest_id: u16,
        phase: Phase,
        kind: RequirementKind,
        ctx: &CharacterContext,
        npc_id: u32,
    ) -> Result<bool, LookupError> {
        let quest = self.lookup(quest_id).await?;
        let requirement = quest
            .requirement(phase, kind)
            .ok_or(LookupError::RequirementNotFound { quest_id, kind })?;
        Ok(requirement.is_satisfied(ctx, npc_id).await)
    }

    /// Check every requirement of a quest phase; unknown quests are never satisfied
    pub async fn all_satisfied(
        &self,
        quest_id: u16,
        phase: Phase,
        ctx: &CharacterContext,
        npc_id: u32,
    ) -> bool {
        match self.lookup(quest_id).await {
            Ok(quest) => quest.requirements_met(phase, ctx, npc_id).await,
            Err(e) => {
                warn!("Cannot evaluate {} requirements: {}", phase.as_str(), e);
                false
            }
        }
    }

    pub async fn count(&self) -> usize {
        self.catalog().await.len()
    }

    pub async fn quests_for_monster(&self, monster_id: u32) -> Vec<u16> {
        self.catalog().await.quests_for_monster(monster_id)
    }

    /// Swap in a freshly built catalog
    pub async fn replace(&self, catalog: QuestCatalog) {
        let count = catalog.len();
        *self.catalog.write().await = Arc::new(catalog);
        info!("Quest catalog replaced ({} quests)", count);
    }

    /// Rebuild from `data_dir` off the async executor; on failure the current catalog stays
    pub async fn reload(&self, data_dir: &Path) -> Result<usize, CatalogError> {
        let _rebuild = self.reload_lock.lock().await;
        let dir = data_dir.to_path_buf();
        let catalog = tokio::task::spawn_blocking(move || QuestCatalog::load_from_directory(&dir))
            .await
            .map_err(|e| CatalogError::Interrupted(e.to_string()))??;
        let count = catalog.len();
        self.replace(catalog).await;
        Ok(count)
    }

    /// Start file watcher for hot-reload.
    /// Returns a channel receiver that signals when reloads occur.
    pub fn start_file_watcher(
        self: &Arc<Self>,
        data_dir: PathBuf,
    ) -> Result<mpsc::Receiver<HotReloadEvent>, notify::Error> {
        use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
        use std::time::Duration;

        let (tx, rx) = mpsc::channel(32);
        let registry = Arc::clone(self);
        let rt = tokio::runtime::Handle::current();

        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;
        watcher.watch(&data_dir, RecursiveMode::Recursive)?;
        info!("Quest hot-reload watcher started for {:?}", data_dir);

        std::thread::spawn(move || {
            // Dropping the watcher stops notifications
            let _watcher = watcher;

            while let Ok(event) = notify_rx.recv() {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    continue;
                }
                let Some(path) = event.paths.iter().find(|p| is_document(p)).cloned() else {
                    continue;
                };
                // One save fires several events; fold the burst into a single rebuild
                std::thread::sleep(RELOAD_DEBOUNCE);
                while notify_rx.try_recv().is_ok() {}
                info!("Detected change in {:?}, triggering reload", path);

                let registry = Arc::clone(&registry);
                let tx = tx.clone();
                let data_dir = data_dir.clone();
                rt.spawn(async move {
                    match registry.reload(&data_dir).await {
                        Ok(count) => {
                            info!("Hot-reload completed successfully ({} quests)", count);
                            let _ = tx
                                .send(HotReloadEvent::Reloaded(path.to_string_lossy().to_string()))
                                .await;
                        }
                        Err(e) => {
                            error!("Hot-reload failed, keeping the previous catalog: {}", e);
                            let _ = tx.send(HotReloadEvent::Error(e.to_string())).await;
                        }
                    }
                });
            }
        });

        Ok(rx)
    }
}

const RELOAD_DEBOUNCE: std::time::Duration = std::time::Duration::from_millis(250);

fn is_document(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("xml")
}

/// Events from the hot-reload watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotReloadEvent {
    /// Catalog rebuilt after a change to this file
    Reloaded(String),
    /// Rebuild failed; the previous catalog is still served
    Error(String),
}
