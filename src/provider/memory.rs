//! In-memory player state implementing every lookup trait.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{
    BuffProvider, Character, CharacterProvider, CharacterQuest, InventoryProvider,
    KillTallyProvider, MonsterBookProvider, Pet, PetProvider, ProviderError, QuestStatus,
    QuestStatusProvider, SkillProvider,
};

/// Concurrent in-memory store of character state
#[derive(Default)]
pub struct InMemoryWorld {
    characters: DashMap<u32, Character>,
    // character_id -> quest_id -> record
    quests: DashMap<u32, HashMap<u16, CharacterQuest>>,
    // (character_id, quest_id) -> monster_id -> kills
    kills: DashMap<(u32, u16), HashMap<u32, u32>>,
    items: DashMap<(u32, u32), u32>,
    skills: DashMap<(u32, u32), u32>,
    cards: DashMap<u32, HashMap<u32, u32>>,
    buffs: DashMap<u32, HashSet<i32>>,
    morphs: DashMap<u32, u32>,
    pets: DashMap<u32, Vec<Pet>>,
    /// When set, every lookup fails as if the backing service were down
    offline: AtomicBool,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_character(&self, character: Character) {
        self.characters.insert(character.id, character);
    }

    pub fn set_quest(&self, character_id: u32, record: CharacterQuest) {
        self.quests
            .entry(character_id)
            .or_default()
            .insert(record.quest_id, record);
    }

    pub fn record_kills(&self, character_id: u32, quest_id: u16, monster_id: u32, count: u32) {
        *self
            .kills
            .entry((character_id, quest_id))
            .or_default()
            .entry(monster_id)
            .or_insert(0) += count;
    }

    pub fn give_item(&self, character_id: u32, item_id: u32, count: u32) {
        *self.items.entry((character_id, item_id)).or_insert(0) += count;
    }

    pub fn learn_skill(&self, character_id: u32, skill_id: u32, level: u32) {
        self.skills.insert((character_id, skill_id), level);
    }

    pub fn add_card(&self, character_id: u32, card_id: u32, count: u32) {
        *self
            .cards
            .entry(character_id)
            .or_default()
            .entry(card_id)
            .or_insert(0) += count;
    }

    pub fn apply_buff(&self, character_id: u32, buff_id: i32) {
        self.buffs.entry(character_id).or_default().insert(buff_id);
    }

    pub fn set_morph(&self, character_id: u32, morph_id: u32) {
        self.morphs.insert(character_id, morph_id);
    }

    pub fn add_pet(&self, character_id: u32, pet: Pet) {
        self.pets.entry(character_id).or_default().push(pet);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), ProviderError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("in-memory world is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CharacterProvider for InMemoryWorld {
    async fn character(&self, character_id: u32) -> Result<Character, ProviderError> {
        self.ensure_online()?;
        self.characters
            .get(&character_id)
            .map(|c| c.clone())
            .ok_or_else(|| ProviderError::NotFound(format!("character {}", character_id)))
    }
}

#[async_trait]
impl QuestStatusProvider for InMemoryWorld {
    async fn quests(&self, character_id: u32) -> Result<Vec<CharacterQuest>, ProviderError> {
        self.ensure_online()?;
        let mut records: Vec<CharacterQuest> = self
            .quests
            .get(&character_id)
            .map(|q| q.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by_key(|r| r.quest_id);
        Ok(records)
    }

    async fn quest(
        &self,
        character_id: u32,
        quest_id: u16,
    ) -> Result<Option<CharacterQuest>, ProviderError> {
        self.ensure_online()?;
        Ok(self
            .quests
            .get(&character_id)
            .and_then(|q| q.get(&quest_id).cloned()))
    }

    async fn quests_by_status(
        &self,
        character_id: u32,
        status: QuestStatus,
    ) -> Result<Vec<CharacterQuest>, ProviderError> {
        let records = self.quests(character_id).await?;
        Ok(records.into_iter().filter(|r| r.status == status).collect())
    }
}

#[async_trait]
impl KillTallyProvider for InMemoryWorld {
    async fn kills(
        &self,
        character_id: u32,
        quest_id: u16,
    ) -> Result<HashMap<u32, u32>, ProviderError> {
        self.ensure_online()?;
        Ok(self
            .kills
            .get(&(character_id, quest_id))
            .map(|k| k.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl InventoryProvider for InMemoryWorld {
    async fn item_count(&self, character_id: u32, item_id: u32) -> Result<u32, ProviderError> {
        self.ensure_online()?;
        Ok(self.items.get(&(character_id, item_id)).map_or(0, |c| *c))
    }
}

#[async_trait]
impl SkillProvider for InMemoryWorld {
    async fn skill_level(&self, character_id: u32, skill_id: u32) -> Result<u32, ProviderError> {
        self.ensure_online()?;
        Ok(self.skills.get(&(character_id, skill_id)).map_or(0, |l| *l))
    }
}

#[async_trait]
impl MonsterBookProvider for InMemoryWorld {
    async fn cards(&self, character_id: u32) -> Result<HashMap<u32, u32>, ProviderError> {
        self.ensure_online()?;
        Ok(self
            .cards
            .get(&character_id)
            .map(|c| c.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl BuffProvider for InMemoryWorld {
    async fn has_buff(&self, character_id: u32, buff_id: i32) -> Result<bool, ProviderError> {
        self.ensure_online()?;
        Ok(self
            .buffs
            .get(&character_id)
            .is_some_and(|b| b.contains(&buff_id)))
    }

    async fn morph(&self, character_id: u32) -> Result<Option<u32>, ProviderError> {
        self.ensure_online()?;
        Ok(self.morphs.get(&character_id).map(|m| *m))
    }
}

#[async_trait]
impl PetProvider for InMemoryWorld {
    async fn pets(&self, character_id: u32) -> Result<Vec<Pet>, ProviderError> {
        self.ensure_online()?;
        Ok(self
            .pets
            .get(&character_id)
            .map(|p| p.clone())
            .unwrap_or_default())
    }
}
