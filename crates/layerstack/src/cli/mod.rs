//! Command implementations.

pub mod args;
pub mod config;
pub mod convert;
pub mod interactive;
pub mod list;
pub mod plan;
