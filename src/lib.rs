//! # Organization Registry Library
//!
//! Multi-tenant organization registry: a master catalog of organizations, one
//! data partition per organization, and admin login over the catalog.

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
