//! Domain services built on the repository traits.

pub mod access;
pub mod conversation;
pub mod hash;
pub mod tag;
pub mod user;
