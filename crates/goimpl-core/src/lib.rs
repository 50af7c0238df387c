//! Core infrastructure for goimpl.
//!
//! This crate provides language-agnostic infrastructure:
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - Text edits with conflict detection and content hashes
//! - Text position utilities
//! - The `path.Name` type reference used by every front door

pub mod error;
pub mod output;
pub mod patch;
pub mod text;
pub mod types;
