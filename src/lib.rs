//! # iPaaS Dashboard API
//!
//! Backend for a dashboard that connects end users' commerce and support
//! tools through Paragon, Integration App and Merge. It signs per-user
//! provider tokens, keeps encrypted provider credentials on each profile,
//! tracks which integrations a user has connected and proxies sample calls
//! to the vendors.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod connectors;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod provisioning;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod token_issuer;
pub use migration;
