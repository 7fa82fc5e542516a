//! Types for handling sensitive credentials.
//!
//! Secret values are never logged or exposed in error messages.

pub mod types;

pub use types::SecretString;
