//! Client code for vet-sw.
//!
//! This crate provides the network fetcher and the versioned cache router
//! shared by the proxy server and the control CLI.

pub mod fetch;
pub mod router;

pub use fetch::{FetchClient, FetchConfig, Fetcher, UrlError, resolve};
pub use router::{CacheRouter, Interception, Routed, RouterConfig, Source};
