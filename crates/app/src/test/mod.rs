//! Shared test infrastructure.

pub mod http;
