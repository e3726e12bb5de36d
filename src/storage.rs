//! Storage subsystem
//!
//! This module provides the durable store for projects, activity events,
//! media assets, and analysis artifacts, plus the soft quota enforcement
//! that runs after every media write.
//!
//! Components:
//! - `store_trait`: the ProjectStore trait defining a uniform API.
//! - `types`: record types and quota limits shared across the store.
//! - `database_storage`: SQLite implementation using sqlx.
//! - `quota`: aggregate accounting and oldest-first render eviction.
//! - `id`: collision-resistant identifier generation.

pub mod database_storage;
pub mod id;
pub mod quota;
pub mod store_trait;
pub mod types;
