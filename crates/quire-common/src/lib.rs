//! Common utilities for quire
//!
//! This crate provides the error type shared by the core, the store adapters
//! and the command-line front end.

pub mod error;

pub use error::{QuireError, Result};
