//! HTTP request handlers for the REST API.

pub mod cache;
pub mod conversation;
pub mod message;
pub mod persona;
pub mod tag;
pub mod user;
