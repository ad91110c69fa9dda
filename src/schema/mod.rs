//! Schema module - Configuration types for rendering runs.

mod config;

pub use config::*;
