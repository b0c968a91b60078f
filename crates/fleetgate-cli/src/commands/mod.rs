//! Command implementations.

pub mod attributes;
pub mod columns;
pub mod config;
pub mod modules;
pub mod permissions;
mod session;
pub mod version;
