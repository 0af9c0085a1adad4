//! Context-and-patch core for AI coding assistants.
//!
//! `context-patch-core` decides what text can be sent to a language model
//! under a token ceiling and turns a model's proposed edits into exact buffer
//! mutations. All operations are synchronous and in-memory:
//!
//! - [`budget`]: token counting, per-category budgets and compression.
//! - [`store`]: tiered reference items serialized within per-tier budgets.
//! - [`diff`]: minimal line edit scripts and unified rendering.
//! - [`patch`]: atomic search/replace edit blocks.

pub mod budget;
pub mod diff;
pub mod patch;
pub mod store;
pub mod tokens;
pub mod types;
