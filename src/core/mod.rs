//! Core functionality: error types and configuration management.

pub mod config;
pub mod error;
