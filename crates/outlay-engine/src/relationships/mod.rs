//! Typed entity relationships with inverse maintenance.
//!
//! # Overview
//!
//! The [`RelationshipManager`] holds a typed adjacency over entity
//! keys. Every registered relationship type can carry an inverse
//! (adding `A -HAS_SUBSIDIARY-> B` also records
//! `B -SUBSIDIARY_OF-> A`), an exclusivity flag, a cardinality cap,
//! and a hierarchical marker that enables cycle prevention: an edge
//! is rejected, not inserted, when the hierarchy already reaches the
//! source from the target.
//!
//! Rejections are ordinary return values. Contradictory source data
//! is expected in bulk government feeds; it gets logged and counted,
//! never panicked over.

pub mod chain;
pub mod manager;

pub use chain::RelationshipChain;
pub use manager::{
    AddOutcome, LinkSummary, RejectReason, RelationshipManager, RelationshipTypeDef,
};
