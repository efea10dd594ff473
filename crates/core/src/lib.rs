//! `courier-core` — foundation types shared by the job queue crates.
//!
//! This crate contains **pure** primitives (no storage or wire concerns).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{JobId, ServiceId};
pub use value_object::ValueObject;
