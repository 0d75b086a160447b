//! Error taxonomy and user guidance for failed audits.
//!
//! Kinds mirror the `errorType` keys sent by the external analysis
//! service. Unknown keys fall back to `GeneralError`; rendering never
//! fails on an unrecognized kind.

use serde::{Deserialize, Serialize};

// ============================================================================
// KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    UrlNotFound,
    DnsNotResolved,
    ConnectionError,
    ConnectionRefused,
    TimeoutError,
    NavigationTimeout,
    PageNotFound,
    AccessDenied,
    AccessForbidden,
    ServerError,
    NetworkError,
    InvalidUrl,
    AnalysisFailed,
    GeneralError,
}

impl ErrorKind {
    pub fn as_key(&self) -> &'static str {
        match self {
            ErrorKind::UrlNotFound => "URL_NOT_FOUND",
            ErrorKind::DnsNotResolved => "DNS_NOT_RESOLVED",
            ErrorKind::ConnectionError => "CONNECTION_ERROR",
            ErrorKind::ConnectionRefused => "CONNECTION_REFUSED",
            ErrorKind::TimeoutError => "TIMEOUT_ERROR",
            ErrorKind::NavigationTimeout => "NAVIGATION_TIMEOUT",
            ErrorKind::PageNotFound => "PAGE_NOT_FOUND",
            ErrorKind::AccessDenied => "ACCESS_DENIED",
            ErrorKind::AccessForbidden => "ACCESS_FORBIDDEN",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::InvalidUrl => "INVALID_URL",
            ErrorKind::AnalysisFailed => "ANALYSIS_FAILED",
            ErrorKind::GeneralError => "GENERAL_ERROR",
        }
    }

    /// Map a wire key back to a kind. Unknown keys become `GeneralError`.
    pub fn from_key(key: &str) -> Self {
        match key {
            "URL_NOT_FOUND" => ErrorKind::UrlNotFound,
            "DNS_NOT_RESOLVED" => ErrorKind::DnsNotResolved,
            "CONNECTION_ERROR" => ErrorKind::ConnectionError,
            "CONNECTION_REFUSED" => ErrorKind::ConnectionRefused,
            "TIMEOUT_ERROR" => ErrorKind::TimeoutError,
            "NAVIGATION_TIMEOUT" => ErrorKind::NavigationTimeout,
            "PAGE_NOT_FOUND" => ErrorKind::PageNotFound,
            "ACCESS_DENIED" => ErrorKind::AccessDenied,
            "ACCESS_FORBIDDEN" => ErrorKind::AccessForbidden,
            "SERVER_ERROR" => ErrorKind::ServerError,
            "NETWORK_ERROR" => ErrorKind::NetworkError,
            "INVALID_URL" => ErrorKind::InvalidUrl,
            "ANALYSIS_FAILED" => ErrorKind::AnalysisFailed,
            _ => ErrorKind::GeneralError,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::UrlNotFound | ErrorKind::DnsNotResolved => {
                "We couldn't find that website address"
            }
            ErrorKind::ConnectionError | ErrorKind::ConnectionRefused => {
                "The website refused our connection"
            }
            ErrorKind::TimeoutError | ErrorKind::NavigationTimeout => {
                "The website took too long to respond"
            }
            ErrorKind::PageNotFound => "That page doesn't exist (404)",
            ErrorKind::AccessDenied | ErrorKind::AccessForbidden => {
                "The website blocked our analyzer"
            }
            ErrorKind::ServerError => "The website returned a server error",
            ErrorKind::NetworkError => "We couldn't reach the audit service",
            ErrorKind::InvalidUrl => "That doesn't look like a valid website address",
            ErrorKind::AnalysisFailed => "The analysis could not be completed",
            ErrorKind::GeneralError => "Something went wrong while analyzing the site",
        }
    }

    /// Static guidance shown next to the failure.
    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            ErrorKind::UrlNotFound | ErrorKind::DnsNotResolved => DNS_SUGGESTIONS,
            ErrorKind::ConnectionError | ErrorKind::ConnectionRefused => CONNECTION_SUGGESTIONS,
            ErrorKind::TimeoutError | ErrorKind::NavigationTimeout => TIMEOUT_SUGGESTIONS,
            ErrorKind::PageNotFound => PAGE_SUGGESTIONS,
            ErrorKind::AccessDenied | ErrorKind::AccessForbidden => ACCESS_SUGGESTIONS,
            ErrorKind::ServerError => SERVER_SUGGESTIONS,
            ErrorKind::NetworkError => NETWORK_SUGGESTIONS,
            ErrorKind::InvalidUrl => INVALID_URL_SUGGESTIONS,
            ErrorKind::AnalysisFailed => ANALYSIS_SUGGESTIONS,
            ErrorKind::GeneralError => GENERAL_SUGGESTIONS,
        }
    }
}

const DNS_SUGGESTIONS: &[&str] = &[
    "Double-check the address for typos",
    "Confirm the domain is registered and publicly resolvable",
    "Try the full address including https://",
];

const CONNECTION_SUGGESTIONS: &[&str] = &[
    "Make sure the website is online",
    "Check whether a firewall blocks outside visitors",
    "Try again in a few minutes",
];

const TIMEOUT_SUGGESTIONS: &[&str] = &[
    "The site may be under heavy load; try again later",
    "Very slow pages can exceed our analysis window",
    "Check the server's response time with your hosting provider",
];

const PAGE_SUGGESTIONS: &[&str] = &[
    "Verify the exact path exists on the site",
    "Try auditing the homepage instead",
];

const ACCESS_SUGGESTIONS: &[&str] = &[
    "The site may block automated tools; check its robots rules",
    "Password-protected pages can't be analyzed",
    "Try a publicly accessible page",
];

const SERVER_SUGGESTIONS: &[&str] = &[
    "The website returned a 5xx error; check its server logs",
    "Try again once the site is healthy",
];

const NETWORK_SUGGESTIONS: &[&str] = &[
    "Check your internet connection",
    "Our service may be briefly unavailable; try again shortly",
];

const INVALID_URL_SUGGESTIONS: &[&str] = &[
    "Enter a full address like https://example.com",
    "Only http and https addresses are supported",
];

const ANALYSIS_SUGGESTIONS: &[&str] = &[
    "Try running the audit again",
    "Some pages with heavy scripts can't be fully analyzed",
];

const GENERAL_SUGGESTIONS: &[&str] = &[
    "Try again in a few minutes",
    "Contact support if the problem persists",
];

// ============================================================================
// FAILURE VALUE
// ============================================================================

/// A classified failure, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl AuditFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestions: kind.suggestions().iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build from the optional fields of an error response body.
    pub fn from_wire(error_type: Option<&str>, message: Option<&str>, fallback: ErrorKind) -> Self {
        let kind = error_type.map(ErrorKind::from_key).unwrap_or(fallback);
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| kind.default_message().to_string());
        Self::new(kind, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for kind in [
            ErrorKind::UrlNotFound,
            ErrorKind::DnsNotResolved,
            ErrorKind::ConnectionError,
            ErrorKind::ConnectionRefused,
            ErrorKind::TimeoutError,
            ErrorKind::NavigationTimeout,
            ErrorKind::PageNotFound,
            ErrorKind::AccessDenied,
            ErrorKind::AccessForbidden,
            ErrorKind::ServerError,
            ErrorKind::NetworkError,
            ErrorKind::InvalidUrl,
            ErrorKind::AnalysisFailed,
            ErrorKind::GeneralError,
        ] {
            assert_eq!(ErrorKind::from_key(kind.as_key()), kind);
        }
    }

    #[test]
    fn unknown_keys_fall_back_to_general() {
        assert_eq!(ErrorKind::from_key("QUANTUM_FLUX"), ErrorKind::GeneralError);
        assert_eq!(ErrorKind::from_key(""), ErrorKind::GeneralError);
    }

    #[test]
    fn every_kind_has_guidance() {
        for key in [
            "URL_NOT_FOUND",
            "DNS_NOT_RESOLVED",
            "CONNECTION_ERROR",
            "CONNECTION_REFUSED",
            "TIMEOUT_ERROR",
            "NAVIGATION_TIMEOUT",
            "PAGE_NOT_FOUND",
            "ACCESS_DENIED",
            "ACCESS_FORBIDDEN",
            "SERVER_ERROR",
            "NETWORK_ERROR",
            "INVALID_URL",
            "ANALYSIS_FAILED",
            "GENERAL_ERROR",
        ] {
            let kind = ErrorKind::from_key(key);
            assert!(!kind.suggestions().is_empty(), "{key} has no suggestions");
            assert!(!kind.default_message().is_empty());
        }
    }

    #[test]
    fn paired_kinds_share_guidance() {
        assert_eq!(
            ErrorKind::UrlNotFound.suggestions(),
            ErrorKind::DnsNotResolved.suggestions()
        );
        assert_eq!(
            ErrorKind::TimeoutError.suggestions(),
            ErrorKind::NavigationTimeout.suggestions()
        );
    }

    #[test]
    fn from_wire_prefers_explicit_fields() {
        let failure = AuditFailure::from_wire(
            Some("SERVER_ERROR"),
            Some("upstream exploded"),
            ErrorKind::GeneralError,
        );
        assert_eq!(failure.kind, ErrorKind::ServerError);
        assert_eq!(failure.message, "upstream exploded");
        assert!(!failure.suggestions.is_empty());

        let failure = AuditFailure::from_wire(None, None, ErrorKind::NetworkError);
        assert_eq!(failure.kind, ErrorKind::NetworkError);
        assert_eq!(failure.message, ErrorKind::NetworkError.default_message());
    }

    #[test]
    fn serializes_with_wire_keys() {
        let json = serde_json::to_string(&ErrorKind::PageNotFound).unwrap();
        assert_eq!(json, "\"PAGE_NOT_FOUND\"");
    }
}
