//! `warden-core`: foundation building blocks shared by the authorization crates.
//!
//! This crate contains **pure** primitives (no HTTP, no storage).

pub mod error;
pub mod id;

pub use error::CoreError;
pub use id::{GroupId, OperationId};
