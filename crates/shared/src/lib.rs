//! Shared types and configuration for Granary.
//!
//! This crate provides the pieces every other crate agrees on:
//! - Typed IDs for type-safe entity references
//! - Fixed-point decimal helpers (4 dp internal, 2 dp reporting, half-up)
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
