use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// User agent sent with every audit API request.
pub const USER_AGENT: &str = concat!("seoscope/", env!("CARGO_PKG_VERSION"));

/// Factory for the audit API client.
pub fn create_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build audit API client")
}
