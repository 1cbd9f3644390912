//! Beacon - page-view analytics collector
//!
//! Collects page-view signals, enriches them with IP geolocation and parsed
//! user-agent data, and serves aggregated statistics to an admin dashboard.
//!
//! # Architecture
//! - `storage`: `EventStore` trait with in-memory and SeaORM backends
//! - `services`: ingestion, dashboard queries, GeoIP and user-agent parsing
//! - `api`: HTTP handlers and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and server mode
//! - `system`: Logging initialisation

pub mod api;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
