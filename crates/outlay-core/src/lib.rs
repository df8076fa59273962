#![forbid(unsafe_code)]
//! outlay-core library.
//!
//! Value model, declarative rule configuration, error codes, the
//! stateless cross-field rule evaluator, and the field-adapter
//! registry shared by the outlay processing pipeline.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums for library errors; `anyhow::Result`
//!   where config loading touches the filesystem.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`,
//!   `debug!`, `trace!`). No subscriber is installed here.

pub mod adapter;
pub mod config;
pub mod error;
pub mod rules;
pub mod value;

pub use error::ErrorCode;
pub use rules::{Dependency, DependencyKind, DependencyRule, ErrorLevel, RuleRegistry};
