//! GameRig CLI library.
//!
//! This crate provides the core functionality for the `gamerig` binary:
//! input loading, logging setup and the generate/validate/sample/list
//! commands.

pub mod commands;
pub mod input;
pub mod logging;
