//! Infrastructure layer for Parley.
//!
//! Contains implementations of the repository traits defined in `parley-core`:
//! SQLite storage, configuration loading, and SHA-256 API key hashing.

pub mod config;
pub mod crypto;
pub mod sqlite;
