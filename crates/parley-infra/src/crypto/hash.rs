//! SHA-256 API key hashing.
//!
//! Implements the `KeyHasher` trait from `parley-core` using the `sha2` crate
//! (RustCrypto ecosystem).

use sha2::{Digest, Sha256};

use parley_core::service::hash::KeyHasher;

/// SHA-256 implementation of `KeyHasher`, producing lowercase hex digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256KeyHasher;

impl Sha256KeyHasher {
    pub fn new() -> Self {
        Self
    }
}

impl KeyHasher for Sha256KeyHasher {
    fn hash_key(&self, key: &str) -> String {
        let digest = Sha256::digest(key.as_bytes());
        format!("{:x}", digest)
    }
}
