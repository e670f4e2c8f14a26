//! Study Stack admin backend
//!
//! Management of users, notes, links and subjects stored in an Appwrite
//! database, plus PostHog-backed analytics for the admin dashboard.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: One-shot commands (stats, CSV export, config generation)
//!
//! # Architecture
//! - `cache`: Query cache with single-flight fetches and the invalidation table
//! - `storage`: Appwrite document, file and function access
//! - `analytics`: HogQL queries and row aggregation
//! - `pagination`: Page requests, filters and the infinite list accumulator
//! - `services`: Reads and mutations over the external services
//! - `api`: HTTP services and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod analytics;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod pagination;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
