//! # CTF Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Scripted tanks and physics worlds implementing the core traits
//! - Map fixtures
//! - Determinism harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
