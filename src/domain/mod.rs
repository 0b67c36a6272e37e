//! Domain layer for the todo agent
//!
//! Capability registry, behavior contract, session models and the
//! transport port. No I/O happens here.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
