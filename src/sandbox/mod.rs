//! Sandbox module containing all execution-related components.

pub mod arena;
pub mod bootstrap;
pub mod bridge;
pub mod classify;
pub mod config;
pub mod executor;
pub mod limits;
pub mod output;
pub mod serialize;
