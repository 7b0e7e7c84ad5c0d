use thiserror::Error;

use crate::data::DocumentError;
use crate::tree::TreeError;

use super::action::ActionKind;
use super::requirement::RequirementKind;

/// Why a single quest could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Structural(#[from] TreeError),
    #[error("unrecognized requirement tag '{0}'")]
    UnrecognizedRequirement(String),
    #[error("unrecognized action tag '{0}'")]
    UnrecognizedAction(String),
    #[error("{0:?} actions have no builder")]
    UnimplementedAction(ActionKind),
    #[error("malformed end date '{0}', expected YYYYMMDDHH")]
    MalformedEndDate(String),
    #[error("quest has no name")]
    MissingName,
}

/// Why the catalog as a whole could not be built
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Structural(#[from] TreeError),
    #[error("invalid quest id '{0}'")]
    InvalidQuestId(String),
    #[error("quest {quest_id}: {source}")]
    Quest {
        quest_id: u16,
        #[source]
        source: CompileError,
    },
    #[error("catalog rebuild was interrupted: {0}")]
    Interrupted(String),
}

/// Facade lookups that found nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("quest {0} not found")]
    QuestNotFound(u16),
    #[error("quest {quest_id} has no {kind:?} requirement for that phase")]
    RequirementNotFound {
        quest_id: u16,
        kind: RequirementKind,
    },
}
