//! Quest Definition Structures
//!
//! A [`QuestDefinition`] is assembled once by a [`QuestBuilder`] and never
//! mutated afterwards.

use std::collections::{BTreeMap, BTreeSet};

use crate::provider::CharacterContext;

use super::action::{Action, ActionKind};
use super::requirement::{Requirement, RequirementKind};

/// The two gated transitions of a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Complete,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Start, Phase::Complete];

    /// Child holding this phase inside a quest's conditions or actions
    pub fn node_name(&self) -> &'static str {
        match self {
            Phase::Start => "0",
            Phase::Complete => "1",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Complete => "complete",
        }
    }
}

/// Requirements and actions of one phase, keyed by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PhaseRules {
    requirements: BTreeMap<RequirementKind, Requirement>,
    actions: BTreeMap<ActionKind, Action>,
}

/// A compiled quest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestDefinition {
    id: u16,
    name: String,
    parent: String,
    time_limit: i32,
    time_limit2: i32,
    auto_start: bool,
    auto_pre_complete: bool,
    auto_complete: bool,
    medal_item_id: i32,
    repeatable: bool,
    info_only: bool,
    relevant_mobs: BTreeSet<u32>,
    start: PhaseRules,
    complete: PhaseRules,
}

impl QuestDefinition {
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn time_limit(&self) -> i32 {
        self.time_limit
    }

    pub fn time_limit2(&self) -> i32 {
        self.time_limit2
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn auto_pre_complete(&self) -> bool {
        self.auto_pre_complete
    }

    pub fn auto_complete(&self) -> bool {
        self.auto_complete
    }

    pub fn medal_item_id(&self) -> i32 {
        self.medal_item_id
    }

    /// True when the quest carries a cooldown interval in either phase
    pub fn repeatable(&self) -> bool {
        self.repeatable
    }

    /// True when the quest had no conditions entry
    pub fn info_only(&self) -> bool {
        self.info_only
    }

    /// Monsters any kill requirement of this quest tracks, ascending
    pub fn relevant_mobs(&self) -> &BTreeSet<u32> {
        &self.relevant_mobs
    }

    pub fn tracks_monster(&self, monster_id: u32) -> bool {
        self.relevant_mobs.contains(&monster_id)
    }

    fn rules(&self, phase: Phase) -> &PhaseRules {
        match phase {
            Phase::Start => &self.start,
            Phase::Complete => &self.complete,
        }
    }

    pub fn requirements(&self, phase: Phase) -> &BTreeMap<RequirementKind, Requirement> {
        &self.rules(phase).requirements
    }

    pub fn requirement(&self, phase: Phase, kind: RequirementKind) -> Option<&Requirement> {
        self.rules(phase).requirements.get(&kind)
    }

    pub fn actions(&self, phase: Phase) -> &BTreeMap<ActionKind, Action> {
        &self.rules(phase).actions
    }

    /// Every requirement of `phase` holds, checked in kind order until one fails
    pub async fn requirements_met(&self, phase: Phase, ctx: &CharacterContext, npc_id: u32) -> bool {
        for requirement in self.requirements(phase).values() {
            if !requirement.is_satisfied(ctx, npc_id).await {
                return false;
            }
        }
        true
    }
}

/// Accumulates one quest before it is frozen into a [`QuestDefinition`]
#[derive(Debug, Clone)]
pub struct QuestBuilder {
    quest: QuestDefinition,
}

impl QuestBuilder {
    pub fn new(id: u16) -> Self {
        Self {
            quest: QuestDefinition {
                id,
                name: String::new(),
                parent: String::new(),
                time_limit: 0,
                time_limit2: 0,
                auto_start: false,
                auto_pre_complete: false,
                auto_complete: false,
                medal_item_id: 0,
                repeatable: false,
                info_only: false,
                relevant_mobs: BTreeSet::new(),
                start: PhaseRules::default(),
                complete: PhaseRules::default(),
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.quest.name = name.into();
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.quest.parent = parent.into();
        self
    }

    pub fn time_limit(mut self, time_limit: i32) -> Self {
        self.quest.time_limit = time_limit;
        self
    }

    pub fn time_limit2(mut self, time_limit2: i32) -> Self {
        self.quest.time_limit2 = time_limit2;
        self
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.quest.auto_start = auto_start;
        self
    }

    pub fn auto_pre_complete(mut self, auto_pre_complete: bool) -> Self {
        self.quest.auto_pre_complete = auto_pre_complete;
        self
    }

    pub fn auto_complete(mut self, auto_complete: bool) -> Self {
        self.quest.auto_complete = auto_complete;
        self
    }

    pub fn medal_item_id(mut self, medal_item_id: i32) -> Self {
        self.quest.medal_item_id = medal_item_id;
        self
    }

    pub fn info_only(mut self) -> Self {
        self.quest.info_only = true;
        self
    }

    pub fn add_start_requirement(self, requirement: Requirement) -> Self {
        self.add_requirement(Phase::Start, requirement)
    }

    pub fn add_completion_requirement(self, requirement: Requirement) -> Self {
        self.add_requirement(Phase::Complete, requirement)
    }

    /// Replaces any earlier requirement of the same kind in that phase
    pub fn add_requirement(mut self, phase: Phase, requirement: Requirement) -> Self {
        if requirement.kind() == RequirementKind::Interval {
            self.quest.repeatable = true;
        }
        // Monsters of an overwritten kill requirement stay relevant
        self.quest.relevant_mobs.extend(requirement.relevant_mobs());

        let rules = self.rules_mut(phase);
        rules.requirements.insert(requirement.kind(), requirement);
        self
    }

    pub fn add_start_action(self, action: Action) -> Self {
        self.add_action(Phase::Start, action)
    }

    pub fn add_completion_action(self, action: Action) -> Self {
        self.add_action(Phase::Complete, action)
    }

    pub fn add_action(mut self, phase: Phase, action: Action) -> Self {
        let rules = self.rules_mut(phase);
        rules.actions.insert(action.kind(), action);
        self
    }

    fn rules_mut(&mut self, phase: Phase) -> &mut PhaseRules {
        match phase {
            Phase::Start => &mut self.quest.start,
            Phase::Complete => &mut self.quest.complete,
        }
    }

    pub fn build(self) -> QuestDefinition {
        self.quest
    }
}
