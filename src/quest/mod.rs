//! Quest System Module
//!
//! Compiles quest documents into typed definitions and answers whether a
//! character meets a quest's start or completion requirements.

pub mod action;
pub mod api;
pub mod catalog;
pub mod definition;
pub mod error;
pub mod registry;
pub mod requirement;

pub use action::{Action, ActionKind};
pub use catalog::QuestCatalog;
pub use definition::{Phase, QuestBuilder, QuestDefinition};
pub use error::{CatalogError, CompileError, LookupError};
pub use registry::{HotReloadEvent, QuestRegistry};
pub use requirement::{Requirement, RequirementKind};
