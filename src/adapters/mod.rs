//! Adapters for the external agent process.

pub mod transports;
