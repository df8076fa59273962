//! Evaluation-order resolvers built on [`DependencyGraph`].
//!
//! Two resolvers with deliberately different failure policies:
//!
//! - [`field::FieldDependencyResolver`] — field graphs come partly
//!   from per-entity-type config merges, so a cycle **degrades** to a
//!   deterministic lexicographic order (logged as a configuration
//!   defect) rather than halting the batch.
//! - [`group::ValidationGroupResolver`] — groups are static config,
//!   so an unknown dependency or a group cycle is **fatal** at
//!   construction; there is no safe default.
//!
//! [`DependencyGraph`]: crate::graph::DependencyGraph

pub mod field;
pub mod group;

pub use field::FieldDependencyResolver;
pub use group::{GroupConfigError, ValidationGroup, ValidationGroupResolver};
