//! Core types and shared functionality for the VET offline cache router.
//!
//! This crate provides:
//! - Versioned cache stores with a SQLite backend
//! - Request classification rules
//! - The router lifecycle state machine and control messages
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod request;
pub mod route;

pub use cache::{CacheDb, CachedEntry, StoreNames};
pub use error::Error;
pub use lifecycle::{Lifecycle, Phase};
pub use message::{ControlMessage, ControlReply};
pub use request::{HttpResponse, InterceptedRequest, RequestKey};
pub use route::{BypassReason, Classifier, Route, RouteRules, Strategy};
