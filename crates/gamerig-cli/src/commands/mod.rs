//! CLI command implementations

pub mod generate;
pub mod list;
pub mod sample;
pub mod validate;
