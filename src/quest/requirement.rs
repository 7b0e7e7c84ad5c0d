//! Quest Requirements
//!
//! Every child of a quest's start (`0`) or completion (`1`) conditions subtree
//! is one requirement. Its tag selects a [`RequirementKind`]; the kind decides
//! which parameters are read from the subtree and how the resulting
//! [`Requirement`] is checked against a character.
//!
//! Compilation is strict: an unknown tag or any malformed parameter fails the
//! whole quest. Evaluation is fail-closed: a lookup error means "not met".

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use tracing::warn;

use crate::provider::{CharacterContext, ProviderError, QuestStatus};
use crate::tree::{Node, TreeError};

use super::definition::Phase;
use super::error::CompileError;

/// Semantic type of a requirement, one per data tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequirementKind {
    Job,
    OtherQuest,
    Item,
    MinimumLevel,
    MaximumLevel,
    EndDate,
    Mob,
    Npc,
    FieldEnter,
    Interval,
    /// Shared by `startscript` and `endscript`
    Script,
    Pet,
    PetTamenessMinimum,
    MonsterBook,
    NormalAutoStart,
    InfoNumber,
    InfoEx,
    QuestComplete,
    Start,
    DayByDay,
    Money,
    Buff,
    ExceptBuff,
    EquipAllNeed,
    EquipSelectNeed,
    Skill,
    Info,
    MonsterBookCard,
    WorldMin,
    WorldMax,
    Morph,
    Popularity,
    EndMeso,
    Level,
    PartyQuestS,
    UserInteract,
    PetRecallLimit,
    PetAutoSpeakingLimit,
    TamingMobLevelMin,
}

impl RequirementKind {
    /// Map a data tag to its kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "job" => RequirementKind::Job,
            "quest" => RequirementKind::OtherQuest,
            "item" => RequirementKind::Item,
            "lvmin" => RequirementKind::MinimumLevel,
            "lvmax" => RequirementKind::MaximumLevel,
            "end" => RequirementKind::EndDate,
            "mob" => RequirementKind::Mob,
            "npc" => RequirementKind::Npc,
            "fieldEnter" => RequirementKind::FieldEnter,
            "interval" => RequirementKind::Interval,
            "startscript" | "endscript" => RequirementKind::Script,
            "pet" => RequirementKind::Pet,
            "pettamenessmin" => RequirementKind::PetTamenessMinimum,
            "mbmin" => RequirementKind::MonsterBook,
            "normalAutoStart" => RequirementKind::NormalAutoStart,
            "infoNumber" => RequirementKind::InfoNumber,
            "infoex" => RequirementKind::InfoEx,
            "questComplete" => RequirementKind::QuestComplete,
            "start" => RequirementKind::Start,
            "dayByDay" => RequirementKind::DayByDay,
            "money" => RequirementKind::Money,
            "buff" => RequirementKind::Buff,
            "exceptbuff" => RequirementKind::ExceptBuff,
            "equipAllNeed" => RequirementKind::EquipAllNeed,
            "equipSelectNeed" => RequirementKind::EquipSelectNeed,
            "skill" => RequirementKind::Skill,
            "info" => RequirementKind::Info,
            "mbcard" => RequirementKind::MonsterBookCard,
            "worldmin" => RequirementKind::WorldMin,
            "worldmax" => RequirementKind::WorldMax,
            "morph" => RequirementKind::Morph,
            "pop" => RequirementKind::Popularity,
            "endmeso" => RequirementKind::EndMeso,
            "level" => RequirementKind::Level,
            "partyQuest_S" => RequirementKind::PartyQuestS,
            "userInteract" => RequirementKind::UserInteract,
            "petRecallLimit" => RequirementKind::PetRecallLimit,
            "petAutoSpeakingLimit" => RequirementKind::PetAutoSpeakingLimit,
            "tamingmoblevelmin" => RequirementKind::TamingMobLevelMin,
            _ => return None,
        };
        Some(kind)
    }
}

/// A compiled requirement with its typed parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Job { jobs: Vec<u16> },
    /// Expected status per quest; `NotStarted` entries are unconstrained
    OtherQuest { quests: BTreeMap<u16, QuestStatus> },
    Item { items: BTreeMap<u32, u32> },
    MinimumLevel(i32),
    MaximumLevel(i32),
    Level(i32),
    /// Satisfied while the evaluation instant precedes this moment
    EndDate(DateTime<Utc>),
    Mob {
        quest_id: u16,
        monsters: BTreeMap<u32, u32>,
    },
    Npc(u32),
    FieldEnter(u32),
    Interval {
        quest_id: u16,
        cooldown: TimeDelta,
    },
    /// Minimum number of completed quests, of any kind
    QuestComplete(i32),
    PetTamenessMinimum(i32),
    MonsterBook(i32),
    Pet { pets: Vec<u32> },
    /// Sign-inverted buff id
    Buff(i32),
    ExceptBuff(i32),
    MonsterBookCard { cards: BTreeMap<u32, u32> },
    /// Skill id -> whether it must be learned (`true`) or absent (`false`)
    Skill { skills: BTreeMap<u32, bool> },
    Money(u32),
    Popularity(i32),
    Morph(u32),
    /// Recognized tag that can never be met yet
    Never(RequirementKind),
    /// Recognized tag with no check yet
    Always(RequirementKind),
}

impl Requirement {
    /// Compile one requirement subtree; the node name is the tag.
    pub fn compile(quest_id: u16, node: &Node) -> Result<Self, CompileError> {
        let tag = node.name();
        let kind = RequirementKind::from_tag(tag)
            .ok_or_else(|| CompileError::UnrecognizedRequirement(tag.to_string()))?;

        let requirement = match kind {
            RequirementKind::Job => Requirement::Job {
                jobs: node
                    .children()?
                    .iter()
                    .map(|j| narrow(j.name(), j.as_integer()?))
                    .collect::<Result<_, _>>()?,
            },
            RequirementKind::OtherQuest => {
                let mut quests = BTreeMap::new();
                for entry in node.children()? {
                    let id = narrow("id", entry.get_integer("id")?)?;
                    let state = entry.get_integer("state")?;
                    quests.insert(id, QuestStatus::from_code(state));
                }
                Requirement::OtherQuest { quests }
            }
            RequirementKind::Item => Requirement::Item {
                items: id_table(node, "count")?,
            },
            RequirementKind::MinimumLevel => Requirement::MinimumLevel(node.as_integer()?),
            RequirementKind::MaximumLevel => Requirement::MaximumLevel(node.as_integer()?),
            RequirementKind::Level => Requirement::Level(node.as_integer()?),
            RequirementKind::EndDate => Requirement::EndDate(parse_end_date(node.as_str()?)?),
            RequirementKind::Mob => Requirement::Mob {
                quest_id,
                monsters: id_table(node, "count")?,
            },
            RequirementKind::Npc => Requirement::Npc(narrow(tag, node.as_integer()?)?),
            RequirementKind::FieldEnter => {
                node.children()?;
                Requirement::FieldEnter(narrow("0", node.get_integer_or("0", 0))?)
            }
            RequirementKind::Interval => {
                let minutes = i64::from(node.as_integer()?);
                Requirement::Interval {
                    quest_id,
                    cooldown: TimeDelta::milliseconds(minutes * 60 * 1000),
                }
            }
            RequirementKind::QuestComplete => Requirement::QuestComplete(node.as_integer()?),
            RequirementKind::PetTamenessMinimum => {
                Requirement::PetTamenessMinimum(node.as_integer()?)
            }
            RequirementKind::MonsterBook => Requirement::MonsterBook(node.as_integer()?),
            RequirementKind::Pet => Requirement::Pet {
                pets: node
                    .children()?
                    .iter()
                    .map(|p| narrow("id", p.get_integer("id")?))
                    .collect::<Result<_, _>>()?,
            },
            RequirementKind::Buff => Requirement::Buff(negated_buff(node)?),
            RequirementKind::ExceptBuff => Requirement::ExceptBuff(negated_buff(node)?),
            RequirementKind::MonsterBookCard => Requirement::MonsterBookCard {
                cards: id_table(node, "min")?,
            },
            RequirementKind::Skill => {
                let mut skills = BTreeMap::new();
                for entry in node.children()? {
                    let id = narrow("id", entry.get_integer("id")?)?;
                    skills.insert(id, entry.get_integer_or("acquire", 0) != 0);
                }
                Requirement::Skill { skills }
            }
            RequirementKind::Money => Requirement::Money(narrow(tag, node.as_integer()?)?),
            RequirementKind::Popularity => Requirement::Popularity(node.as_integer()?),
            RequirementKind::Morph => Requirement::Morph(narrow(tag, node.as_integer()?)?),
            RequirementKind::EquipAllNeed
            | RequirementKind::EquipSelectNeed
            | RequirementKind::Info => Requirement::Never(kind),
            RequirementKind::Script
            | RequirementKind::NormalAutoStart
            | RequirementKind::InfoNumber
            | RequirementKind::InfoEx
            | RequirementKind::Start
            | RequirementKind::DayByDay
            | RequirementKind::WorldMin
            | RequirementKind::WorldMax
            | RequirementKind::EndMeso
            | RequirementKind::PartyQuestS
            | RequirementKind::UserInteract
            | RequirementKind::PetRecallLimit
            | RequirementKind::PetAutoSpeakingLimit
            | RequirementKind::TamingMobLevelMin => Requirement::Always(kind),
        };
        Ok(requirement)
    }

    pub fn kind(&self) -> RequirementKind {
        match self {
            Requirement::Job { .. } => RequirementKind::Job,
            Requirement::OtherQuest { .. } => RequirementKind::OtherQuest,
            Requirement::Item { .. } => RequirementKind::Item,
            Requirement::MinimumLevel(_) => RequirementKind::MinimumLevel,
            Requirement::MaximumLevel(_) => RequirementKind::MaximumLevel,
            Requirement::Level(_) => RequirementKind::Level,
            Requirement::EndDate(_) => RequirementKind::EndDate,
            Requirement::Mob { .. } => RequirementKind::Mob,
            Requirement::Npc(_) => RequirementKind::Npc,
            Requirement::FieldEnter(_) => RequirementKind::FieldEnter,
            Requirement::Interval { .. } => RequirementKind::Interval,
            Requirement::QuestComplete(_) => RequirementKind::QuestComplete,
            Requirement::PetTamenessMinimum(_) => RequirementKind::PetTamenessMinimum,
            Requirement::MonsterBook(_) => RequirementKind::MonsterBook,
            Requirement::Pet { .. } => RequirementKind::Pet,
            Requirement::Buff(_) => RequirementKind::Buff,
            Requirement::ExceptBuff(_) => RequirementKind::ExceptBuff,
            Requirement::MonsterBookCard { .. } => RequirementKind::MonsterBookCard,
            Requirement::Skill { .. } => RequirementKind::Skill,
            Requirement::Money(_) => RequirementKind::Money,
            Requirement::Popularity(_) => RequirementKind::Popularity,
            Requirement::Morph(_) => RequirementKind::Morph,
            Requirement::Never(kind) | Requirement::Always(kind) => *kind,
        }
    }

    /// Monsters this requirement tracks kills for
    pub fn relevant_mobs(&self) -> Vec<u32> {
        match self {
            Requirement::Mob { monsters, .. } => monsters.keys().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Check the requirement for a character talking to `npc_id`.
    ///
    /// Lookup failures are logged and count as not met.
    pub async fn is_satisfied(&self, ctx: &CharacterContext, npc_id: u32) -> bool {
        match self.check(ctx, npc_id).await {
            Ok(met) => met,
            Err(e) => {
                warn!(
                    "Unable to check {:?} requirement for character {}, assuming it is not met: {}",
                    self.kind(),
                    ctx.character_id,
                    e
                );
                false
            }
        }
    }

    async fn check(&self, ctx: &CharacterContext, npc_id: u32) -> Result<bool, ProviderError> {
        let character_id = ctx.character_id;
        let providers = &ctx.providers;

        let met = match self {
            Requirement::Job { jobs } => jobs.contains(&ctx.character().await?.job_id),
            Requirement::OtherQuest { quests } => {
                let mut constrained = quests
                    .iter()
                    .filter(|(_, status)| **status != QuestStatus::NotStarted)
                    .peekable();
                if constrained.peek().is_none() {
                    return Ok(true);
                }
                let records: HashMap<u16, QuestStatus> = providers
                    .quests
                    .quests(character_id)
                    .await?
                    .into_iter()
                    .map(|r| (r.quest_id, r.status))
                    .collect();
                constrained.all(|(id, expected)| records.get(id) == Some(expected))
            }
            Requirement::Item { items } => {
                for (item_id, count) in items {
                    if providers.inventory.item_count(character_id, *item_id).await? < *count {
                        return Ok(false);
                    }
                }
                true
            }
            Requirement::MinimumLevel(level) => {
                i32::from(ctx.character().await?.level) >= *level
            }
            Requirement::MaximumLevel(level) => {
                i32::from(ctx.character().await?.level) <= *level
            }
            Requirement::Level(level) => i32::from(ctx.character().await?.level) == *level,
            Requirement::EndDate(end) => ctx.now < *end,
            Requirement::Mob { quest_id, monsters } => {
                let kills = providers.kills.kills(character_id, *quest_id).await?;
                monsters
                    .iter()
                    .all(|(id, count)| kills.get(id).copied().unwrap_or(0) >= *count)
            }
            Requirement::Npc(required) => npc_id == *required,
            Requirement::FieldEnter(map_id) => ctx.character().await?.map_id == *map_id,
            Requirement::Interval { quest_id, cooldown } => {
                match providers.quests.quest(character_id, *quest_id).await? {
                    Some(record) if record.status == QuestStatus::Completed => record
                        .completed_at
                        .is_none_or(|at| at <= ctx.now - *cooldown),
                    _ => true,
                }
            }
            Requirement::QuestComplete(count) => {
                let completed = providers
                    .quests
                    .quests_by_status(character_id, QuestStatus::Completed)
                    .await?;
                completed.len() as i64 >= i64::from(*count)
            }
            Requirement::PetTamenessMinimum(minimum) => providers
                .pets
                .pets(character_id)
                .await?
                .iter()
                .any(|p| p.tameness >= *minimum),
            Requirement::MonsterBook(count) => {
                providers.monster_book.cards(character_id).await?.len() as i64 >= i64::from(*count)
            }
            Requirement::Pet { pets } => providers
                .pets
                .pets(character_id)
                .await?
                .iter()
                .any(|p| pets.contains(&p.id)),
            Requirement::Buff(buff_id) => providers.buffs.has_buff(character_id, *buff_id).await?,
            Requirement::ExceptBuff(buff_id) => {
                !providers.buffs.has_buff(character_id, *buff_id).await?
            }
            Requirement::MonsterBookCard { cards } => {
                let book = providers.monster_book.cards(character_id).await?;
                cards
                    .iter()
                    .any(|(id, min)| book.get(id).is_some_and(|held| held >= min))
            }
            Requirement::Skill { skills } => {
                for (skill_id, must_have) in skills {
                    let level = providers.skills.skill_level(character_id, *skill_id).await?;
                    if *must_have != (level > 0) {
                        return Ok(false);
                    }
                }
                true
            }
            Requirement::Money(meso) => ctx.character().await?.meso >= *meso,
            Requirement::Popularity(fame) => i32::from(ctx.character().await?.fame) >= *fame,
            Requirement::Morph(morph) => {
                providers.buffs.morph(character_id).await? == Some(*morph)
            }
            Requirement::Never(_) => false,
            Requirement::Always(_) => true,
        };
        Ok(met)
    }
}

/// Compile every requirement of one phase of a quest's conditions.
///
/// A missing phase subtree is an empty phase, not an error.
pub fn compile_phase(
    quest_id: u16,
    conditions: &Node,
    phase: Phase,
) -> Result<Vec<Requirement>, CompileError> {
    conditions.children()?;
    let Ok(root) = conditions.child_by_name(phase.node_name()) else {
        return Ok(Vec::new());
    };
    root.children()?
        .iter()
        .map(|node| Requirement::compile(quest_id, node))
        .collect()
}

/// Entries of the form `{ id, <value_field> }`, keyed by id
fn id_table(node: &Node, value_field: &str) -> Result<BTreeMap<u32, u32>, CompileError> {
    let mut table = BTreeMap::new();
    for entry in node.children()? {
        let id = narrow("id", entry.get_integer("id")?)?;
        let value = narrow(value_field, entry.get_integer(value_field)?)?;
        table.insert(id, value);
    }
    Ok(table)
}

/// Buff ids are stored as strings and matched sign-inverted
fn negated_buff(node: &Node) -> Result<i32, TreeError> {
    let raw = node.as_integer_from_string()?;
    raw.checked_neg().ok_or_else(|| TreeError::Parse {
        name: node.name().to_string(),
        value: raw.to_string(),
    })
}

fn narrow<T: TryFrom<i32>>(name: &str, value: i32) -> Result<T, TreeError> {
    T::try_from(value).map_err(|_| TreeError::Parse {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// `YYYYMMDDHH` in server local time.
///
/// Out-of-range fields roll over into the next unit, so hour 24 is midnight of
/// the following day and month 13 is January of the following year.
fn parse_end_date(raw: &str) -> Result<DateTime<Utc>, CompileError> {
    let malformed = || CompileError::MalformedEndDate(raw.to_string());
    if raw.len() != 10 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let field = |range: std::ops::Range<usize>| raw[range].parse::<i64>().map_err(|_| malformed());
    let year = field(0..4)?;
    let month = field(4..6)?;
    let day = field(6..8)?;
    let hour = field(8..10)?;

    // Month 0 is December of the previous year
    let months = year * 12 + month - 1;
    let year = i32::try_from(months.div_euclid(12)).map_err(|_| malformed())?;
    let month = u32::try_from(months.rem_euclid(12) + 1).map_err(|_| malformed())?;
    let local = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.checked_add_signed(TimeDelta::days(day - 1)))
        .and_then(|date| date.checked_add_signed(TimeDelta::hours(hour)))
        .ok_or_else(malformed)?;

    // A wall-clock time skipped by a DST change resolves to the hour after
    Local
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| Local.from_local_datetime(&(local + TimeDelta::hours(1))).earliest())
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        Character, CharacterQuest, InMemoryWorld, Pet, Providers,
    };
    use std::sync::Arc;

    const CHARACTER: u32 = 7;

    fn world() -> Arc<InMemoryWorld> {
        let world = Arc::new(InMemoryWorld::new());
        world.insert_character(Character {
            id: CHARACTER,
            job_id: 110,
            map_id: 100000000,
            level: 30,
            fame: 5,
            meso: 1000,
        });
        world
    }

    fn ctx(world: &Arc<InMemoryWorld>) -> CharacterContext {
        CharacterContext::new(CHARACTER, Providers::from_backend(world.clone()))
    }

    fn entry(name: &str, fields: &[(&str, &str)]) -> Node {
        Node::group(
            name,
            fields.iter().map(|(k, v)| Node::integer(*k, *v)).collect(),
        )
    }

    #[test]
    fn test_tag_table() {
        assert_eq!(RequirementKind::from_tag("lvmin"), Some(RequirementKind::MinimumLevel));
        assert_eq!(RequirementKind::from_tag("startscript"), Some(RequirementKind::Script));
        assert_eq!(RequirementKind::from_tag("endscript"), Some(RequirementKind::Script));
        assert_eq!(RequirementKind::from_tag("partyQuest_S"), Some(RequirementKind::PartyQuestS));
        assert_eq!(RequirementKind::from_tag("LVMIN"), None);
    }

    #[test]
    fn test_unknown_tag_fails() {
        let err = Requirement::compile(1, &Node::integer("teleport", "1")).unwrap_err();
        assert_eq!(err, CompileError::UnrecognizedRequirement("teleport".to_string()));
    }

    #[test]
    fn test_malformed_parameters_fail() {
        // Job list expects a container
        assert!(Requirement::compile(1, &Node::integer("job", "100")).is_err());
        // Level thresholds are integer leaves
        assert!(Requirement::compile(1, &Node::string("lvmin", "10")).is_err());
        assert!(Requirement::compile(1, &Node::integer("lvmin", "ten")).is_err());
        // Item entries need a count
        let item = Node::group("item", vec![entry("0", &[("id", "2000000")])]);
        assert!(Requirement::compile(1, &item).is_err());
    }

    #[test]
    fn test_end_date_parsing() {
        assert!(matches!(
            Requirement::compile(1, &Node::string("end", "2010010100")),
            Ok(Requirement::EndDate(_))
        ));
        for raw in ["201001010", "20100101000", "2010A10100", "2010-10100"] {
            assert_eq!(
                Requirement::compile(1, &Node::string("end", raw)),
                Err(CompileError::MalformedEndDate(raw.to_string()))
            );
        }
    }

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_end_date_fields_roll_over() {
        let end = |raw: &str| match Requirement::compile(1, &Node::string("end", raw)) {
            Ok(Requirement::EndDate(at)) => at,
            other => panic!("{raw}: {other:?}"),
        };
        assert_eq!(end("2010051512"), local(2010, 5, 15, 12));
        assert_eq!(end("2009123124"), local(2010, 1, 1, 0));
        assert_eq!(end("2010130100"), local(2011, 1, 1, 0));
        assert_eq!(end("2010023100"), local(2010, 3, 3, 0));
        assert_eq!(end("2010000100"), local(2009, 12, 1, 0));
        assert_eq!(end("2010010000"), local(2009, 12, 31, 0));
    }

    #[test]
    fn test_buff_ids_are_negated() {
        let buff = Requirement::compile(1, &Node::string("buff", "2022109")).unwrap();
        assert_eq!(buff, Requirement::Buff(-2022109));
        let except = Requirement::compile(1, &Node::string("exceptbuff", "-5")).unwrap();
        assert_eq!(except, Requirement::ExceptBuff(5));
    }

    #[test]
    fn test_mob_surfaces_relevant_monsters() {
        let mob = Node::group(
            "mob",
            vec![
                entry("0", &[("id", "100100"), ("count", "10")]),
                entry("1", &[("id", "100101"), ("count", "5")]),
            ],
        );
        let requirement = Requirement::compile(2000, &mob).unwrap();
        assert_eq!(requirement.kind(), RequirementKind::Mob);
        assert_eq!(requirement.relevant_mobs(), vec![100100, 100101]);
        assert!(Requirement::Npc(1).relevant_mobs().is_empty());
    }

    #[test]
    fn test_field_enter_defaults_to_map_zero() {
        let empty = Node::group("fieldEnter", vec![]);
        assert_eq!(Requirement::compile(1, &empty).unwrap(), Requirement::FieldEnter(0));
        let set = Node::group("fieldEnter", vec![Node::integer("0", "100000000")]);
        assert_eq!(Requirement::compile(1, &set).unwrap(), Requirement::FieldEnter(100000000));
    }

    #[test]
    fn test_compile_phase_handles_missing_subtree() {
        let conditions = Node::group("1000", vec![Node::group("1", vec![Node::integer("lvmin", "5")])]);
        assert!(compile_phase(1000, &conditions, Phase::Start).unwrap().is_empty());
        let complete = compile_phase(1000, &conditions, Phase::Complete).unwrap();
        assert_eq!(complete, vec![Requirement::MinimumLevel(5)]);
    }

    #[tokio::test]
    async fn test_job_membership() {
        let world = world();
        let job = Node::group("job", vec![Node::integer("0", "100"), Node::integer("1", "110")]);
        let requirement = Requirement::compile(1, &job).unwrap();
        assert!(requirement.is_satisfied(&ctx(&world), 0).await);

        world.insert_character(Character {
            id: CHARACTER,
            job_id: 200,
            map_id: 0,
            level: 30,
            fame: 0,
            meso: 0,
        });
        assert!(!requirement.is_satisfied(&ctx(&world), 0).await);
    }

    #[tokio::test]
    async fn test_interval_cooldown_boundary() {
        let world = world();
        let interval = Requirement::compile(3000, &Node::integer("interval", "60")).unwrap();

        // Never completed
        assert!(interval.is_satisfied(&ctx(&world), 0).await);

        let completed_at = Utc::now();
        world.set_quest(CHARACTER, CharacterQuest::completed(3000, completed_at));
        let at_59 = ctx(&world).at(completed_at + TimeDelta::minutes(59));
        let at_60 = ctx(&world).at(completed_at + TimeDelta::minutes(60));
        assert!(!interval.is_satisfied(&at_59, 0).await);
        assert!(interval.is_satisfied(&at_60, 0).await);

        // Started again after a completion record was replaced
        world.set_quest(CHARACTER, CharacterQuest::started(3000));
        assert!(interval.is_satisfied(&at_59, 0).await);
    }

    #[tokio::test]
    async fn test_other_quest_states() {
        let world = world();
        let needs_complete = Node::group("quest", vec![entry("0", &[("id", "5"), ("state", "2")])]);
        let requirement = Requirement::compile(1, &needs_complete).unwrap();
        assert!(!requirement.is_satisfied(&ctx(&world), 0).await);

        world.set_quest(CHARACTER, CharacterQuest::started(5));
        assert!(!requirement.is_satisfied(&ctx(&world), 0).await);
        world.set_quest(CHARACTER, CharacterQuest::completed(5, Utc::now()));
        assert!(requirement.is_satisfied(&ctx(&world), 0).await);

        let unconstrained = Node::group("quest", vec![entry("0", &[("id", "7"), ("state", "0")])]);
        let requirement = Requirement::compile(1, &unconstrained).unwrap();
        assert!(requirement.is_satisfied(&ctx(&world), 0).await);
        world.set_quest(CHARACTER, CharacterQuest::started(7));
        assert!(requirement.is_satisfied(&ctx(&world), 0).await);
    }

    #[tokio::test]
    async fn test_level_bounds() {
        let world = world();
        let ctx = ctx(&world);
        assert!(Requirement::MinimumLevel(30).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::MinimumLevel(31).is_satisfied(&ctx, 0).await);
        assert!(Requirement::MaximumLevel(30).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::MaximumLevel(29).is_satisfied(&ctx, 0).await);
        assert!(Requirement::Level(30).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::Level(10).is_satisfied(&ctx, 0).await);
    }

    #[tokio::test]
    async fn test_items_and_kills() {
        let world = world();
        let items = Requirement::Item {
            items: BTreeMap::from([(4000000, 10), (4000001, 1)]),
        };
        world.give_item(CHARACTER, 4000000, 10);
        assert!(!items.is_satisfied(&ctx(&world), 0).await);
        world.give_item(CHARACTER, 4000001, 1);
        assert!(items.is_satisfied(&ctx(&world), 0).await);

        let mob = Requirement::Mob {
            quest_id: 2000,
            monsters: BTreeMap::from([(100100, 3)]),
        };
        world.record_kills(CHARACTER, 2000, 100100, 2);
        assert!(!mob.is_satisfied(&ctx(&world), 0).await);
        // Kills for another quest do not count
        world.record_kills(CHARACTER, 2001, 100100, 5);
        assert!(!mob.is_satisfied(&ctx(&world), 0).await);
        world.record_kills(CHARACTER, 2000, 100100, 1);
        assert!(mob.is_satisfied(&ctx(&world), 0).await);
    }

    #[tokio::test]
    async fn test_character_capabilities() {
        let world = world();
        let ctx = ctx(&world);

        assert!(Requirement::Npc(9010000).is_satisfied(&ctx, 9010000).await);
        assert!(!Requirement::Npc(9010000).is_satisfied(&ctx, 1).await);
        assert!(Requirement::FieldEnter(100000000).is_satisfied(&ctx, 0).await);
        assert!(Requirement::Money(1000).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::Money(1001).is_satisfied(&ctx, 0).await);
        assert!(Requirement::Popularity(5).is_satisfied(&ctx, 0).await);

        world.apply_buff(CHARACTER, -2022109);
        assert!(Requirement::Buff(-2022109).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::ExceptBuff(-2022109).is_satisfied(&ctx, 0).await);
        assert!(Requirement::ExceptBuff(-1).is_satisfied(&ctx, 0).await);

        world.set_morph(CHARACTER, 1000);
        assert!(Requirement::Morph(1000).is_satisfied(&ctx, 0).await);

        world.add_pet(CHARACTER, Pet { id: 5000000, tameness: 20 });
        assert!(Requirement::Pet { pets: vec![5000000] }.is_satisfied(&ctx, 0).await);
        assert!(Requirement::PetTamenessMinimum(20).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::PetTamenessMinimum(21).is_satisfied(&ctx, 0).await);

        world.learn_skill(CHARACTER, 1001, 1);
        let skills = Requirement::Skill {
            skills: BTreeMap::from([(1001, true), (1002, false)]),
        };
        assert!(skills.is_satisfied(&ctx, 0).await);
        world.learn_skill(CHARACTER, 1002, 3);
        assert!(!skills.is_satisfied(&ctx, 0).await);
    }

    #[tokio::test]
    async fn test_monster_book_and_completed_count() {
        let world = world();
        let ctx = ctx(&world);
        world.add_card(CHARACTER, 2380000, 2);

        assert!(Requirement::MonsterBook(1).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::MonsterBook(2).is_satisfied(&ctx, 0).await);
        let cards = Requirement::MonsterBookCard {
            cards: BTreeMap::from([(2380000, 3), (2380001, 1)]),
        };
        assert!(!cards.is_satisfied(&ctx, 0).await);
        world.add_card(CHARACTER, 2380000, 1);
        assert!(cards.is_satisfied(&ctx, 0).await);

        world.set_quest(CHARACTER, CharacterQuest::completed(1, Utc::now()));
        world.set_quest(CHARACTER, CharacterQuest::started(2));
        assert!(Requirement::QuestComplete(1).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::QuestComplete(2).is_satisfied(&ctx, 0).await);
    }

    #[tokio::test]
    async fn test_end_date_uses_evaluation_instant() {
        let world = world();
        let end = Requirement::compile(1, &Node::string("end", "2030010100")).unwrap();
        let before = ctx(&world).at(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let after = ctx(&world).at(Utc.with_ymd_and_hms(2040, 1, 1, 0, 0, 0).unwrap());
        assert!(end.is_satisfied(&before, 0).await);
        assert!(!end.is_satisfied(&after, 0).await);
    }

    #[tokio::test]
    async fn test_placeholders() {
        let world = world();
        let ctx = ctx(&world);
        for tag in ["equipAllNeed", "equipSelectNeed", "info"] {
            let requirement = Requirement::compile(1, &Node::integer(tag, "1")).unwrap();
            assert!(!requirement.is_satisfied(&ctx, 0).await, "{tag}");
        }
        for tag in ["worldmin", "dayByDay", "startscript", "tamingmoblevelmin", "infoex"] {
            let requirement = Requirement::compile(1, &Node::string(tag, "x")).unwrap();
            assert!(requirement.is_satisfied(&ctx, 0).await, "{tag}");
        }
    }

    #[tokio::test]
    async fn test_lookup_failures_are_not_met() {
        let world = world();
        world.set_offline(true);
        let ctx = ctx(&world);
        assert!(!Requirement::MinimumLevel(1).is_satisfied(&ctx, 0).await);
        assert!(!Requirement::ExceptBuff(-1).is_satisfied(&ctx, 0).await);
        let interval = Requirement::Interval {
            quest_id: 1,
            cooldown: TimeDelta::minutes(1),
        };
        assert!(!interval.is_satisfied(&ctx, 0).await);
        // No lookup, so no failure
        assert!(Requirement::Npc(3).is_satisfied(&ctx, 3).await);
    }

    #[tokio::test]
    async fn test_unknown_character_is_not_met() {
        let world = Arc::new(InMemoryWorld::new());
        let ctx = CharacterContext::new(404, Providers::from_backend(world));
        assert!(!Requirement::MinimumLevel(1).is_satisfied(&ctx, 0).await);
    }
}
