//! KeyHasher trait for API key digests.
//!
//! Defined in parley-core so the user service can hash keys without coupling
//! to a specific algorithm. The `Sha256KeyHasher` adapter lives in
//! parley-infra.

/// One-way hashing of API keys before they are stored or looked up.
pub trait KeyHasher: Send + Sync {
    /// Hex-encoded digest of `key`.
    fn hash_key(&self, key: &str) -> String;
}
