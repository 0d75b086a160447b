//! Report acquisition against the external analysis service.
//!
//! The flow coordinates one audit end to end:
//! 1. Field validation (no network on failure)
//! 2. Submission through the orchestrator under a fresh generation
//! 3. Staged progress playback while the request is in flight
//! 4. Sequential-then-fetch join: the response is awaited only after
//!    playback completes
//! 5. Classification into a report or a taxonomy failure
//!
//! Every non-validation failure terminates in the orchestrator's `Error`
//! phase; nothing is silently swallowed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::config::ServiceConfig;
use crate::domain::guidance::{AuditFailure, ErrorKind};
use crate::domain::models::{AuditReport, AuditRequest};
use crate::error::Result;
use crate::handoff::{stash_report, HandoffStore};
use crate::service::http::create_client;
use crate::service::orchestrator::{AuditState, Orchestrator};
use crate::service::progress::{ProgressSimulator, ProgressSnapshot, ProgressStep, DEFAULT_STEPS};
use crate::validate::validate_request;

// ============================================================================
// SERVICE
// ============================================================================

/// Drives audits against the external `POST /api/audit` contract.
pub struct AuditService {
    http: Client,
    endpoint: Url,
    steps: &'static [ProgressStep],
    include_screenshot: bool,
    orchestrator: Arc<Orchestrator>,
    handoff: Option<Arc<dyn HandoffStore>>,
}

impl AuditService {
    pub fn new(config: &ServiceConfig, orchestrator: Arc<Orchestrator>) -> Result<Self> {
        let endpoint = config.audit_endpoint()?;
        let http = create_client(Duration::from_millis(config.request_timeout_ms))?;
        Ok(Self {
            http,
            endpoint,
            steps: DEFAULT_STEPS,
            include_screenshot: config.include_screenshot,
            orchestrator,
            handoff: None,
        })
    }

    /// Persist fetched reports for a cross-navigation handoff.
    pub fn with_handoff(mut self, store: Arc<dyn HandoffStore>) -> Self {
        self.handoff = Some(store);
        self
    }

    pub fn with_steps(mut self, steps: &'static [ProgressStep]) -> Self {
        self.steps = steps;
        self
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Build a request carrying this service's default screenshot flag.
    pub fn new_request(&self, url: impl Into<String>, email: impl Into<String>) -> AuditRequest {
        let request = AuditRequest::new(url, email);
        if self.include_screenshot {
            request.with_screenshot(true)
        } else {
            request
        }
    }

    /// Validate and launch one audit.
    ///
    /// Validation failures return an error before any request is issued
    /// and before the orchestrator leaves its current phase. On success
    /// the orchestrator is already in `Loading` when this returns; the
    /// returned handle exposes the playback for a loading view.
    pub fn begin(&self, request: AuditRequest) -> Result<RunningAudit> {
        validate_request(&request)?;

        let generation =
            self.orchestrator.submit(request.url.clone(), request.email.clone());
        debug!(url = %request.url, generation, "starting audit");

        Ok(self.launch(request, generation))
    }

    /// Re-issue the last failed submission with its pending values.
    /// Returns None when the current phase has no failure to retry from.
    pub fn begin_retry(&self) -> Option<RunningAudit> {
        let generation = self.orchestrator.retry()?;
        let state = self.orchestrator.snapshot();
        debug!(url = %state.pending_url, generation, "retrying audit");

        // pending values already passed validation on their original
        // submission
        let request = self.new_request(state.pending_url, state.pending_email);
        Some(self.launch(request, generation))
    }

    fn launch(&self, request: AuditRequest, generation: u64) -> RunningAudit {
        let simulator = Arc::new(ProgressSimulator::new(self.steps));
        let progress = simulator.subscribe();
        let cancel = simulator.cancellation_token();

        let handle = tokio::spawn(drive(
            self.http.clone(),
            self.endpoint.clone(),
            request,
            simulator,
            Arc::clone(&self.orchestrator),
            self.handoff.clone(),
            generation,
        ));

        RunningAudit { progress, handle, cancel }
    }

    /// Run one audit to completion and return the resulting state.
    pub async fn run(&self, request: AuditRequest) -> Result<AuditState> {
        self.begin(request)?.join().await
    }
}

/// Handle to an audit in flight.
pub struct RunningAudit {
    progress: watch::Receiver<ProgressSnapshot>,
    handle: JoinHandle<AuditState>,
    cancel: CancellationToken,
}

impl RunningAudit {
    /// Playback observable for the loading view.
    pub fn progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress.clone()
    }

    /// Tear the flow down: step timers are cancelled and the response,
    /// if it ever arrives, resolves into the void.
    pub fn abort(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }

    /// Wait for the flow to finish and return the final state.
    pub async fn join(self) -> Result<AuditState> {
        Ok(self.handle.await.context("audit flow did not complete")?)
    }
}

async fn drive(
    http: Client,
    endpoint: Url,
    request: AuditRequest,
    simulator: Arc<ProgressSimulator>,
    orchestrator: Arc<Orchestrator>,
    handoff: Option<Arc<dyn HandoffStore>>,
    generation: u64,
) -> AuditState {
    // aborting the flow must not leave step timers running
    let _teardown = simulator.cancellation_token().drop_guard();
    simulator.start();

    // Issue the request now; its result is joined only after playback.
    let fetch = tokio::spawn(post_audit(http, endpoint, request));

    simulator.wait_complete().await;

    let outcome = match fetch.await {
        Ok(outcome) => outcome,
        Err(join_err) => {
            warn!("audit request task failed: {join_err}");
            AuditOutcome::Failure(AuditFailure::new(
                ErrorKind::GeneralError,
                ErrorKind::GeneralError.default_message(),
            ))
        }
    };

    match outcome {
        AuditOutcome::Report(report) => {
            if let Some(store) = &handoff {
                // stash before resolving, and only for the live submission
                if orchestrator.generation() == generation {
                    stash_report(store.as_ref(), &report);
                }
            }
            orchestrator.resolve_success(generation, report);
        }
        AuditOutcome::Failure(failure) => {
            orchestrator.resolve_error(generation, failure);
        }
    }

    orchestrator.snapshot()
}

// ============================================================================
// RESPONSE CLASSIFICATION
// ============================================================================

enum AuditOutcome {
    Report(AuditReport),
    Failure(AuditFailure),
}

async fn post_audit(http: Client, endpoint: Url, request: AuditRequest) -> AuditOutcome {
    let response = match http.post(endpoint).json(&request).send().await {
        Ok(response) => response,
        Err(err) => return AuditOutcome::Failure(classify_transport(&err)),
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        return AuditOutcome::Failure(classify_error_body(status, &body));
    }

    match parse_success_body(&body) {
        Ok(report) => AuditOutcome::Report(report),
        Err(failure) => AuditOutcome::Failure(failure),
    }
}

/// A 2xx body must carry `success: true` and a readable `report`.
fn parse_success_body(body: &Value) -> std::result::Result<AuditReport, AuditFailure> {
    let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
    let report = body.get("report");

    match (success, report) {
        (true, Some(report)) => AuditReport::from_json(report).map_err(|err| {
            warn!("audit service returned an unreadable report: {err}");
            AuditFailure::new(ErrorKind::GeneralError, err.to_string())
        }),
        _ => Err(classify_error_body(StatusCode::OK, body)),
    }
}

fn classify_error_body(status: StatusCode, body: &Value) -> AuditFailure {
    let error_type = body.get("errorType").and_then(Value::as_str);
    let message = body.get("error").and_then(Value::as_str);
    AuditFailure::from_wire(error_type, message, kind_for_status(status))
}

fn kind_for_status(status: StatusCode) -> ErrorKind {
    if status.is_server_error() {
        ErrorKind::ServerError
    } else {
        ErrorKind::GeneralError
    }
}

fn classify_transport(err: &reqwest::Error) -> AuditFailure {
    // connection refused, DNS failure and client-side timeouts all land here
    AuditFailure::new(
        ErrorKind::NetworkError,
        format!("Could not reach the audit service: {err}"),
    )
}
