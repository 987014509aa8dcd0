// src/fetch/mod.rs

//! Remote-source access layer.
//!
//! - [`client`] owns the timed, staleness-guarded HTTP GET.
//! - [`facade`] wraps it per source with endpoint construction, query
//!   toggles, and the per-URL height tracker.

pub mod client;
pub mod facade;

pub use client::{BLOCK_HEIGHT_HEADER, FetchError, HttpClient, QueryOutcome};
pub use facade::{QueryToggles, Rpc};
