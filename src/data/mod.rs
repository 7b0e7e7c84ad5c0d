pub mod loader;
pub mod store;

pub use loader::{QuestDocuments, ACT, CHECK, QUEST_INFO};
pub use store::{DocumentError, DocumentStore};
