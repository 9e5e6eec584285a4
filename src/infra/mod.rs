//! Infrastructure layer implementations.

pub mod cache;
pub mod database;
pub mod gateway;

pub use cache::VerificationCache;
pub use database::{PostgresClient, PostgresConfig};
pub use gateway::{PaystackConfig, PaystackGateway};
