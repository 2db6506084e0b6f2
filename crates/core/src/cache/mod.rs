//! SQLite-backed, versioned cache stores.
//!
//! A store is a named map from request key to the last response written for
//! that key. Stores are created on first use and remember creation order.
//! Access goes through tokio-rusqlite, so every operation runs on one
//! background thread and concurrent writers to the same key resolve as
//! last-write-wins.

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod names;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use names::StoreNames;
