//! # mp-core
//!
//! Core types shared across all metaport crates:
//! - The fixed set of extracted metadata entity types
//! - The schemaless `Record` shape every chunk decodes into
//! - The validated run context each export step receives
//! - Step response types returned to the workflow engine
//! - Cross-cutting error types

pub mod context;
pub mod enums;
pub mod errors;
pub mod record;
pub mod responses;

pub use context::RunContext;
pub use enums::EntityType;
pub use errors::CoreError;
pub use record::Record;
