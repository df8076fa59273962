//! Directed-graph primitive for dependency ordering.
//!
//! # Overview
//!
//! [`DependencyGraph`] wraps a petgraph [`DiGraph`] keyed by string
//! node ids and adds the operations the resolvers need: idempotent
//! node/edge insertion, cached topological ordering with an explicit
//! ok-flag (no exceptions for the expected-cycle case), reachability,
//! ancestor/descendant queries, and SCC grouping for diagnostics.
//!
//! ## Edge Direction
//!
//! An edge `from → to` means "from must be processed before to". Each
//! resolver documents how it maps its own dependency direction onto
//! this convention at the call site.
//!
//! ## Order Cache
//!
//! Every mutation bumps a version counter; `topological_order`
//! recomputes only when the cached order's version is stale. The
//! cache sits behind an `RwLock` so concurrent readers never block
//! each other.
//!
//! [`DiGraph`]: petgraph::graph::DiGraph

pub mod cycles;
pub mod dependency;

pub use cycles::{find_cycle_groups, would_create_cycle};
pub use dependency::DependencyGraph;
