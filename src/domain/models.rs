//! Report and request value types for the audit contract.
//!
//! These mirror the external analysis service's JSON wire format
//! (camelCase keys). The service is the sole source of truth for scores;
//! nothing here recomputes aggregates. Reports are validated once, at the
//! boundary where they are parsed from a response body.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

// ============================================================================
// PARSE ERRORS
// ============================================================================

/// A response body that cannot be accepted as a report.
///
/// Only `url`, `overallScore` and `analyzedAt` are required; everything
/// else is optional and failures there are never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReportError {
    #[error("report is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("report field `{field}` is malformed: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl MalformedReportError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField { field, reason: reason.into() }
    }
}

// ============================================================================
// REQUEST
// ============================================================================

/// Client request to the external audit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub url: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_screenshot: Option<bool>,
}

impl AuditRequest {
    pub fn new(url: impl Into<String>, email: impl Into<String>) -> Self {
        Self { url: url.into(), email: email.into(), include_screenshot: None }
    }

    pub fn with_screenshot(mut self, include: bool) -> Self {
        self.include_screenshot = Some(include);
        self
    }
}

// ============================================================================
// SCORE BANDS
// ============================================================================

/// Severity band for a 0-100 score, using the Lighthouse cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    Good,
    NeedsWork,
    Poor,
}

impl ScoreBand {
    pub fn classify(score: f64) -> Self {
        if score >= 90.0 {
            ScoreBand::Good
        } else if score >= 50.0 {
            ScoreBand::NeedsWork
        } else {
            ScoreBand::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::NeedsWork => "needs-work",
            ScoreBand::Poor => "poor",
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Issue counters reported by the analysis service.
///
/// Rendered as given; the cross-field sum invariant is the producer's
/// responsibility and missing counters default to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    #[serde(default)]
    pub critical_issues: u32,
    #[serde(default)]
    pub warning_issues: u32,
    #[serde(default)]
    pub passed_checks: u32,
    #[serde(default)]
    pub total_checks: u32,
}

/// One scored section of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionReport {
    pub score: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl SectionReport {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::classify(self.score)
    }
}

/// The result of one audit, produced by the external analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub url: String,
    pub analyzed_at: DateTime<Utc>,
    pub overall_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AuditSummary>,
    #[serde(rename = "onPageSEO", skip_serializing_if = "Option::is_none")]
    pub on_page_seo: Option<SectionReport>,
    #[serde(rename = "technicalSEO", skip_serializing_if = "Option::is_none")]
    pub technical_seo: Option<SectionReport>,
    #[serde(rename = "offPageSEO", skip_serializing_if = "Option::is_none")]
    pub off_page_seo: Option<SectionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SectionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighthouse_result: Option<SectionReport>,
}

impl AuditReport {
    /// Parse a report from a response body.
    ///
    /// Accepts partial reports: optional sections that are absent, or
    /// present but garbled, are dropped. Missing or malformed `url`,
    /// `overallScore` and `analyzedAt` are the only fatal cases.
    pub fn from_json(value: &Value) -> Result<Self, MalformedReportError> {
        let obj = value
            .as_object()
            .ok_or_else(|| MalformedReportError::invalid("report", "not a JSON object"))?;

        let url = required_str(obj, "url")?;
        let parsed = Url::parse(url)
            .map_err(|e| MalformedReportError::invalid("url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MalformedReportError::invalid(
                "url",
                format!("unsupported scheme `{}`", parsed.scheme()),
            ));
        }

        let overall_score = obj
            .get("overallScore")
            .ok_or(MalformedReportError::MissingField("overallScore"))?
            .as_f64()
            .ok_or_else(|| MalformedReportError::invalid("overallScore", "not a number"))?;
        if !overall_score.is_finite() || !(0.0..=100.0).contains(&overall_score) {
            return Err(MalformedReportError::invalid(
                "overallScore",
                format!("{overall_score} is outside 0-100"),
            ));
        }

        let analyzed_raw = required_str(obj, "analyzedAt")?;
        let analyzed_at = DateTime::parse_from_rfc3339(analyzed_raw)
            .map_err(|e| MalformedReportError::invalid("analyzedAt", e.to_string()))?
            .with_timezone(&Utc);

        Ok(Self {
            url: url.to_string(),
            analyzed_at,
            overall_score,
            summary: lenient(obj, "summary"),
            on_page_seo: lenient_section(obj, "onPageSEO"),
            technical_seo: lenient_section(obj, "technicalSEO"),
            off_page_seo: lenient_section(obj, "offPageSEO"),
            security: lenient_section(obj, "security"),
            lighthouse_result: lenient_section(obj, "lighthouseResult"),
        })
    }

    pub fn overall_band(&self) -> ScoreBand {
        ScoreBand::classify(self.overall_score)
    }

    /// Present sections, in display order.
    pub fn sections(&self) -> Vec<(&'static str, &SectionReport)> {
        [
            ("On-Page SEO", self.on_page_seo.as_ref()),
            ("Technical SEO", self.technical_seo.as_ref()),
            ("Off-Page SEO", self.off_page_seo.as_ref()),
            ("Security", self.security.as_ref()),
            ("Lighthouse", self.lighthouse_result.as_ref()),
        ]
        .into_iter()
        .filter_map(|(label, section)| section.map(|s| (label, s)))
        .collect()
    }
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, MalformedReportError> {
    obj.get(field)
        .ok_or(MalformedReportError::MissingField(field))?
        .as_str()
        .ok_or_else(|| MalformedReportError::invalid(field, "not a string"))
}

fn lenient<T: DeserializeOwned>(obj: &Map<String, Value>, field: &str) -> Option<T> {
    obj.get(field).and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn lenient_section(obj: &Map<String, Value>, field: &str) -> Option<SectionReport> {
    lenient::<SectionReport>(obj, field)
        .filter(|s| s.score.is_finite() && (0.0..=100.0).contains(&s.score))
}
