//! tagwatch application library
//!
//! This exposes the adapters, services and TUI of tagwatch for testing and
//! for the binary's composition root.

pub mod adapters;
pub mod cli;
pub mod runtime;
pub mod services;
pub mod tui;
