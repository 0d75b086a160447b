//! Service configuration for the audit client.

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::error::Result;

/// Endpoint path of the external analysis service.
pub const AUDIT_ENDPOINT_PATH: &str = "/api/audit";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base address of the audit API, e.g. `https://api.seoscope.dev`
    pub api_base: String,
    pub request_timeout_ms: u64,
    /// Ask the analysis service to capture a page screenshot
    pub include_screenshot: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000".to_string(),
            request_timeout_ms: 30_000,
            include_screenshot: false,
        }
    }
}

impl ServiceConfig {
    /// Resolve the full audit endpoint from the configured base.
    pub fn audit_endpoint(&self) -> Result<Url> {
        let base = Url::parse(&self.api_base)
            .with_context(|| format!("Invalid api_base: {}", self.api_base))?;
        let endpoint = base
            .join(AUDIT_ENDPOINT_PATH)
            .with_context(|| format!("Cannot join {} onto {}", AUDIT_ENDPOINT_PATH, self.api_base))?;
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_onto_base() {
        let config = ServiceConfig {
            api_base: "https://api.seoscope.dev".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.audit_endpoint().unwrap().as_str(),
            "https://api.seoscope.dev/api/audit"
        );
    }

    #[test]
    fn bad_base_is_an_error() {
        let config = ServiceConfig {
            api_base: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.audit_endpoint().is_err());
    }
}
