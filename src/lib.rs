//! Quest catalog service.
//!
//! Decodes exported quest documents, compiles them into typed quest
//! definitions and evaluates quest requirements against live character state.

pub mod config;
pub mod data;
pub mod provider;
pub mod quest;
pub mod tree;
