//! Quest Actions
//!
//! Actions are the rewards and side effects attached to a quest phase. Every
//! tag is recognized, but no action has a builder yet, so any quest that
//! declares one fails to compile instead of silently dropping the action.

use crate::provider::CharacterContext;
use crate::tree::Node;

use super::definition::Phase;
use super::error::CompileError;

/// Semantic type of an action, one per data tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    Experience,
    Money,
    Item,
    Skill,
    NextQuest,
    Popularity,
    BuffItem,
    PetSkill,
    No,
    Yes,
    Npc,
    MinimumLevel,
    NormalAutoStart,
    PetTameness,
    PetSpeed,
    Info,
    Zero,
}

impl ActionKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "exp" => Some(ActionKind::Experience),
            "money" => Some(ActionKind::Money),
            "item" => Some(ActionKind::Item),
            "skill" => Some(ActionKind::Skill),
            "nextQuest" => Some(ActionKind::NextQuest),
            "pop" => Some(ActionKind::Popularity),
            "buffItemID" => Some(ActionKind::BuffItem),
            "petskill" => Some(ActionKind::PetSkill),
            "no" => Some(ActionKind::No),
            "yes" => Some(ActionKind::Yes),
            "npc" => Some(ActionKind::Npc),
            "lvmin" => Some(ActionKind::MinimumLevel),
            "normalAutoStart" => Some(ActionKind::NormalAutoStart),
            "pettameness" => Some(ActionKind::PetTameness),
            "petspeed" => Some(ActionKind::PetSpeed),
            "info" => Some(ActionKind::Info),
            "0" => Some(ActionKind::Zero),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Experience => "exp",
            ActionKind::Money => "money",
            ActionKind::Item => "item",
            ActionKind::Skill => "skill",
            ActionKind::NextQuest => "nextQuest",
            ActionKind::Popularity => "pop",
            ActionKind::BuffItem => "buffItemID",
            ActionKind::PetSkill => "petskill",
            ActionKind::No => "no",
            ActionKind::Yes => "yes",
            ActionKind::Npc => "npc",
            ActionKind::MinimumLevel => "lvmin",
            ActionKind::NormalAutoStart => "normalAutoStart",
            ActionKind::PetTameness => "pettameness",
            ActionKind::PetSpeed => "petspeed",
            ActionKind::Info => "info",
            ActionKind::Zero => "0",
        }
    }
}

/// A compiled action.
///
/// No variants exist until action behavior is defined, so a value of this
/// type cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {}

impl Action {
    pub fn compile(node: &Node) -> Result<Self, CompileError> {
        let tag = node.name();
        let kind = ActionKind::from_tag(tag)
            .ok_or_else(|| CompileError::UnrecognizedAction(tag.to_string()))?;

        match kind {
            ActionKind::Experience
            | ActionKind::Money
            | ActionKind::Item
            | ActionKind::Skill
            | ActionKind::NextQuest
            | ActionKind::Popularity
            | ActionKind::BuffItem
            | ActionKind::PetSkill
            | ActionKind::No
            | ActionKind::Yes
            | ActionKind::Npc
            | ActionKind::MinimumLevel
            | ActionKind::NormalAutoStart
            | ActionKind::PetTameness
            | ActionKind::PetSpeed
            | ActionKind::Info
            | ActionKind::Zero => Err(CompileError::UnimplementedAction(kind)),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match *self {}
    }

    /// Whether the action can be applied for this character
    pub async fn check(&self, _ctx: &CharacterContext) -> bool {
        match *self {}
    }

    pub async fn run(&self, _ctx: &CharacterContext) {
        match *self {}
    }
}

/// Compile every action of one phase of a quest's action subtree.
///
/// A missing phase subtree yields no actions.
pub fn compile_phase(actions: &Node, phase: Phase) -> Result<Vec<Action>, CompileError> {
    actions.children()?;
    let Ok(root) = actions.child_by_name(phase.node_name()) else {
        return Ok(Vec::new());
    };
    root.children()?.iter().map(Action::compile).collect()
}
