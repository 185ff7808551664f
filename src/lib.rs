//! Translation management service.
//!
//! Stores localized key/value strings grouped by language and optionally
//! tagged, serves them through a filterable CRUD API, and exports an entire
//! locale's strings as one flat JSON object backed by a per-language
//! snapshot cache.
//!
//! # Architecture
//!
//! - `store`: SQLite record store (entities, filtered/paginated queries)
//! - `filters`: query parameters → composed store predicates
//! - `cache`: per-language export snapshots with TTL and single-flight fills
//! - `export`: locale resolution + cache-backed snapshot computation
//! - `handlers`/`routes`: the HTTP surface over the above

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod security;
pub mod store;
