//! # Repository Layer
//!
//! SeaORM access for profiles and connection state.

pub mod integration_connection;
pub mod profile;

pub use integration_connection::IntegrationConnectionRepository;
pub use profile::{ProfileCredentials, ProfileRepository, ProfileUpdate};
