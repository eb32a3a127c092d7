//! # kieli-base
//!
//! Pure structural atoms for the kieli compiler.
//!
//! This crate provides the foundational types used throughout kieli:
//!
//! - [`Arena`]/[`define_id!`] — typed-id index vectors for compiler nodes
//! - [`StringPool`]/[`StringId`] — string interning for O(1) equality
//! - [`Position`]/[`Range`] — character-based source locations
//!
//! # Design Principles
//!
//! This crate has **no knowledge of kieli syntax or I/O**. It provides
//! only generic, reusable infrastructure that higher-level crates build
//! upon. Nodes reference each other by id, never by pointer, so arenas
//! are freely movable and nodes freely copyable.

pub mod arena;
pub mod intern;
pub mod span;

pub use arena::{Arena, ArenaId};
pub use intern::{StringId, StringPool};
pub use span::{Position, Range};
