//! Hierarchical document model shared by every quest document.

pub mod node;
pub mod xml;

pub use node::{Node, TreeError, PATH_SEPARATOR};
pub use xml::{parse_document, DecodeError};
