//! Reply orchestration, domain services, and repository trait definitions
//! for Parley.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements. It depends only on `parley-types` -- never on
//! `parley-infra` or any database/IO crate.

pub mod reply;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
