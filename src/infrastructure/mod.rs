pub mod assistant_client;
pub mod config;
pub mod error;
