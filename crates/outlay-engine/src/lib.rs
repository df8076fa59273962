#![forbid(unsafe_code)]
//! outlay-engine library.
//!
//! Dependency-ordered validation and entity relationship management
//! for the outlay record pipeline: the directed-graph primitive,
//! field and group dependency resolvers, the per-record validation
//! orchestrator, and the relationship manager.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums; expected conditions (cycles,
//!   rejected edges) are plain return values, never panics or
//!   control-flow exceptions.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`,
//!   `debug!`, `trace!`).
//! - **Concurrency**: mutation requires `&mut self` and is serialized
//!   per instance by the borrow checker; read paths are `&self` and
//!   safe to share across validation workers.

pub mod graph;
pub mod order;
pub mod relationships;
pub mod validate;

pub use graph::DependencyGraph;
pub use order::field::FieldDependencyResolver;
pub use order::group::ValidationGroupResolver;
pub use relationships::RelationshipManager;
pub use validate::ValidationOrchestrator;
