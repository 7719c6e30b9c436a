//! Cryptographic operations for Parley.
//!
//! - `hash`: SHA-256 digests of API keys

pub mod hash;
