// src/errors.rs

//! Crate-wide error aliases.
//!
//! Orchestration-level code uses `anyhow` throughout; the typed taxonomy for
//! remote-call failures lives in [`crate::fetch::FetchError`].

pub use anyhow::{Error, Result};
