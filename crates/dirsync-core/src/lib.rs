//! Ambient concerns shared by the directory sync binaries.

pub mod config;
pub mod tracing;
