//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley chat
//! platform: users, conversations, group members, messages, tags, personas,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
pub mod persona;
pub mod tag;
pub mod user;
