pub mod client;
pub mod config;

pub use client::ApiClient;
pub use config::ClientConfig;
