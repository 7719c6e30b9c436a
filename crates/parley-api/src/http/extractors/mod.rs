//! Request extractors shared by the REST handlers.

pub mod auth;
pub mod path;
