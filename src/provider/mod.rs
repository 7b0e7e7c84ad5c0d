//! External Lookups
//!
//! Requirement predicates read live player state through these traits. The
//! real services sit behind the transport layer; this crate only consumes
//! them, plus ships an in-memory implementation for tests and embedders.

pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryWorld;

/// Failure of an external lookup; predicates turn these into "not satisfied"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Character attributes as served by the character service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: u32,
    pub job_id: u16,
    pub map_id: u32,
    pub level: u8,
    pub fame: i16,
    pub meso: u32,
}

/// Status of a quest for a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    NotStarted,
    Started,
    Completed,
    Undefined,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::NotStarted => "NOT_STARTED",
            QuestStatus::Started => "STARTED",
            QuestStatus::Completed => "COMPLETED",
            QuestStatus::Undefined => "UNDEFINED",
        }
    }

    /// Numeric state code used by quest data files
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => QuestStatus::NotStarted,
            1 => QuestStatus::Started,
            2 => QuestStatus::Completed,
            _ => QuestStatus::Undefined,
        }
    }
}

/// One quest record of a character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterQuest {
    pub quest_id: u16,
    pub status: QuestStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CharacterQuest {
    pub fn started(quest_id: u16) -> Self {
        Self {
            quest_id,
            status: QuestStatus::Started,
            completed_at: None,
        }
    }

    pub fn completed(quest_id: u16, at: DateTime<Utc>) -> Self {
        Self {
            quest_id,
            status: QuestStatus::Completed,
            completed_at: Some(at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: u32,
    pub tameness: i32,
}

#[async_trait]
pub trait CharacterProvider: Send + Sync {
    async fn character(&self, character_id: u32) -> Result<Character, ProviderError>;
}

#[async_trait]
pub trait QuestStatusProvider: Send + Sync {
    async fn quests(&self, character_id: u32) -> Result<Vec<CharacterQuest>, ProviderError>;

    /// `Ok(None)` when the character has no record for the quest
    async fn quest(
        &self,
        character_id: u32,
        quest_id: u16,
    ) -> Result<Option<CharacterQuest>, ProviderError>;

    async fn quests_by_status(
        &self,
        character_id: u32,
        status: QuestStatus,
    ) -> Result<Vec<CharacterQuest>, ProviderError>;
}

/// Per-quest monster kill counts (monster id -> kills)
#[async_trait]
pub trait KillTallyProvider: Send + Sync {
    async fn kills(&self, character_id: u32, quest_id: u16)
    -> Result<HashMap<u32, u32>, ProviderError>;
}

#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn item_count(&self, character_id: u32, item_id: u32) -> Result<u32, ProviderError>;
}

/// Skill levels; 0 means not learned
#[async_trait]
pub trait SkillProvider: Send + Sync {
    async fn skill_level(&self, character_id: u32, skill_id: u32) -> Result<u32, ProviderError>;
}

/// Monster book cards (card id -> quantity)
#[async_trait]
pub trait MonsterBookProvider: Send + Sync {
    async fn cards(&self, character_id: u32) -> Result<HashMap<u32, u32>, ProviderError>;
}

#[async_trait]
pub trait BuffProvider: Send + Sync {
    async fn has_buff(&self, character_id: u32, buff_id: i32) -> Result<bool, ProviderError>;

    async fn morph(&self, character_id: u32) -> Result<Option<u32>, ProviderError>;
}

#[async_trait]
pub trait PetProvider: Send + Sync {
    async fn pets(&self, character_id: u32) -> Result<Vec<Pet>, ProviderError>;
}

/// The full set of lookups a requirement may need
#[derive(Clone)]
pub struct Providers {
    pub characters: Arc<dyn CharacterProvider>,
    pub quests: Arc<dyn QuestStatusProvider>,
    pub kills: Arc<dyn KillTallyProvider>,
    pub inventory: Arc<dyn InventoryProvider>,
    pub skills: Arc<dyn SkillProvider>,
    pub monster_book: Arc<dyn MonsterBookProvider>,
    pub buffs: Arc<dyn BuffProvider>,
    pub pets: Arc<dyn PetProvider>,
}

impl Providers {
    /// Use one backend for every lookup
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CharacterProvider
            + QuestStatusProvider
            + KillTallyProvider
            + InventoryProvider
            + SkillProvider
            + MonsterBookProvider
            + BuffProvider
            + PetProvider
            + 'static,
    {
        Self {
            characters: backend.clone(),
            quests: backend.clone(),
            kills: backend.clone(),
            inventory: backend.clone(),
            skills: backend.clone(),
            monster_book: backend.clone(),
            buffs: backend.clone(),
            pets: backend,
        }
    }
}

/// Who is being evaluated, where to look them up, and the evaluation instant
#[derive(Clone)]
pub struct CharacterContext {
    pub character_id: u32,
    pub providers: Providers,
    pub now: DateTime<Utc>,
}

impl CharacterContext {
    pub fn new(character_id: u32, providers: Providers) -> Self {
        Self {
            character_id,
            providers,
            now: Utc::now(),
        }
    }

    /// Evaluate as of a fixed instant instead of the wall clock
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub async fn character(&self) -> Result<Character, ProviderError> {
        self.providers.characters.character(self.character_id).await
    }
}
