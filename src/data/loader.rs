//! Quest Document Loader
//!
//! Joins the three quest documents by quest id and compiles each quest.

use tracing::{debug, info};

use crate::quest::action;
use crate::quest::definition::{Phase, QuestBuilder, QuestDefinition};
use crate::quest::error::{CatalogError, CompileError};
use crate::quest::requirement;
use crate::tree::{Node, TreeError};

use super::store::{DocumentError, DocumentStore};

/// Quest metadata, one child per quest id
pub const QUEST_INFO: &str = "QuestInfo.img.xml";
/// Start and completion conditions
pub const CHECK: &str = "Check.img.xml";
/// Start and completion actions
pub const ACT: &str = "Act.img.xml";

/// The three decoded quest documents
#[derive(Debug, Clone)]
pub struct QuestDocuments {
    pub info: Node,
    pub checks: Node,
    pub acts: Node,
}

impl QuestDocuments {
    pub fn read(store: &DocumentStore) -> Result<Self, DocumentError> {
        Ok(Self {
            info: store.read(QUEST_INFO)?,
            checks: store.read(CHECK)?,
            acts: store.read(ACT)?,
        })
    }

    /// Compile every quest listed in the info document, in document order.
    ///
    /// The first quest that fails aborts the whole load.
    pub fn compile(&self) -> Result<Vec<QuestDefinition>, CatalogError> {
        let entries = self.info.children()?;
        let mut quests = Vec::with_capacity(entries.len());

        for info in entries {
            let quest_id: u16 = info
                .name()
                .parse()
                .map_err(|_| CatalogError::InvalidQuestId(info.name().to_string()))?;
            let quest = self
                .compile_quest(quest_id, info)
                .map_err(|source| CatalogError::Quest { quest_id, source })?;
            quests.push(quest);
        }

        info!("Compiled {} quests", quests.len());
        Ok(quests)
    }

    /// Compile one quest from its info entry and the matching conditions and actions
    pub fn compile_quest(&self, quest_id: u16, info: &Node) -> Result<QuestDefinition, CompileError> {
        // Entries are matched by the info node's own name
        let Ok(conditions) = self.checks.child_by_name(info.name()) else {
            debug!("Quest {} has no conditions, recording it as info only", quest_id);
            return Ok(QuestBuilder::new(quest_id).info_only().build());
        };

        let mut builder = read_metadata(QuestBuilder::new(quest_id), info)?;

        for phase in Phase::ALL {
            for requirement in requirement::compile_phase(quest_id, conditions, phase)? {
                builder = builder.add_requirement(phase, requirement);
            }
        }

        if let Ok(acts) = self.acts.child_by_name(info.name()) {
            for phase in Phase::ALL {
                for action in action::compile_phase(acts, phase)? {
                    builder = builder.add_action(phase, action);
                }
            }
        }

        Ok(builder.build())
    }
}

/// Read the required name and every well-formed optional field
fn read_metadata(builder: QuestBuilder, info: &Node) -> Result<QuestBuilder, CompileError> {
    let name = match info.get_string("name") {
        Ok(name) => name,
        Err(TreeError::NotFound(_)) => return Err(CompileError::MissingName),
        Err(e) => return Err(e.into()),
    };
    let mut builder = builder.name(name);

    if let Ok(parent) = info.get_string("parent") {
        builder = builder.parent(parent);
    }
    if let Ok(time_limit) = info.get_integer("timeLimit") {
        builder = builder.time_limit(time_limit);
    }
    if let Ok(time_limit2) = info.get_integer("timeLimit2") {
        builder = builder.time_limit2(time_limit2);
    }
    if let Ok(auto_start) = info.get_boolean("autoStart") {
        builder = builder.auto_start(auto_start);
    }
    if let Ok(auto_pre_complete) = info.get_boolean("autoPreComplete") {
        builder = builder.auto_pre_complete(auto_pre_complete);
    }
    if let Ok(auto_complete) = info.get_boolean("autoComplete") {
        builder = builder.auto_complete(auto_complete);
    }
    if let Ok(medal) = info.get_integer("viewMedalItem") {
        builder = builder.medal_item_id(medal);
    }
    Ok(builder)
}
