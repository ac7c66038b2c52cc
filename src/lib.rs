//! Report delivery client for the ESG reporting dashboard service.
//!
//! A request dispatcher with a TTL response cache and static-asset fallback,
//! a persisted mirror of the caller's report list, and a staged report
//! download (signed link, then authenticated proxy, then bundled example).

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod observability;
pub mod types;

// Layered boundaries: use cases and ports, infrastructure adapters
pub mod app;
pub mod infra;

pub use client::{ClientPorts, EsgClient};
pub use error::{ClientError, Result};
