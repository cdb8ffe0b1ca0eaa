//! Tagwatch Core - pure domain logic with no terminal or network code
//!
//! This crate contains the business logic, domain types, and ports (interfaces)
//! for tagwatch: resolving how far a repository's default branch has drifted
//! from its last release, and the dashboard state machine that keeps those
//! results current. HTTP, the filesystem and the terminal live in adapters.

pub mod app;
pub mod domain;
pub mod error;
pub mod ports;
pub mod resolver;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
pub use resolver::StatusResolver;
