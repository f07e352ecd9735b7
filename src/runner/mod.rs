//! # Suite Runner
//!
//! Drives the registry against the live endpoint: builds the payload for
//! each case, performs the single POST, evaluates the response contract,
//! and collects one outcome per execution. Cases share nothing, so the
//! parallel mode is plain task fan-out with no coordination.

use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::assertions::{self, ACCEPTED_STATUSES};
use crate::cases::{Registry, TestCase};
use crate::environment::ApiSettings;
use crate::error::IntakeError;
use crate::http::client::ApiClient;
use crate::http::response::ApiResponse;
use crate::payload::{self, CustomPayload, QueryParams};

/// Execution mode for a suite run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Serial,
    Parallel,
}

/// Result of one case execution.
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub label: String,
    pub description: String,
    pub passed: bool,
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    pub checks: Vec<assertions::AssertionResult>,
    pub error: Option<String>,
}

/// Binds the registry, the HTTP client, and the run settings.
#[derive(Clone)]
pub struct SuiteRunner {
    registry: Registry,
    client: ApiClient,
    settings: ApiSettings,
}

impl SuiteRunner {
    pub fn new(registry: Registry, client: ApiClient, settings: ApiSettings) -> Self {
        Self {
            registry,
            client,
            settings,
        }
    }

    /// Execute one registered case and evaluate the success contract.
    pub async fn run_case(&self, case: &TestCase) -> CaseOutcome {
        info!(case = %case.file_id, "processing: {}", case.description);

        let started = Instant::now();
        let params = match payload::for_case_id(&self.registry, &case.file_id) {
            Ok(params) => params,
            Err(err) => {
                return errored_outcome(case.file_id.clone(), case.description.clone(), started, err);
            }
        };
        let response = match self
            .client
            .post_query_authorized(&self.settings.endpoint, &params)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(case = %case.file_id, error = %err, "request failed");
                return errored_outcome(case.file_id.clone(), case.description.clone(), started, err);
            }
        };

        let checks = assertions::evaluate_all(&assertions::process_success_checks(), &response);
        let status_ok = ACCEPTED_STATUSES.contains(&response.status);
        let passed = status_ok && checks.iter().all(|c| c.passed);
        let error = (!status_ok).then(|| {
            format!(
                "expected status in {ACCEPTED_STATUSES:?}, got {} {}",
                response.status, response.status_text
            )
        });

        if passed {
            if let Ok(reply) = response.decode_process_reply() {
                info!(
                    case = %case.file_id,
                    status = %reply.status,
                    session_id = %reply.session_id,
                    response_time = reply.response_time,
                    "session created"
                );
            }
        }

        report_case(&case.file_id, passed, &response);
        CaseOutcome {
            label: case.file_id.clone(),
            description: case.description.clone(),
            passed,
            status_code: Some(response.status),
            duration_ms: response.duration_ms,
            checks,
            error,
        }
    }

    /// Deliberately omit `file_url`; the service must answer 422.
    pub async fn run_negative_missing_file_url(&self) -> CaseOutcome {
        let params = CustomPayload::new()
            .file_type("community")
            .file_id("test_001")
            .builder_id("test_builder")
            .entity_id("test_entity")
            .build();

        self.run_negative(
            "missing_file_url",
            "Request without file_url is rejected",
            params,
        )
        .await
    }

    /// Send a file_type outside the known classifications; expects 422.
    pub async fn run_negative_invalid_file_type(&self) -> CaseOutcome {
        let params = CustomPayload::new()
            .file_url("https://example.com/test.pdf")
            .file_type("invalid_file_type")
            .file_id("invalid_001")
            .builder_id("test_builder")
            .entity_id("test_entity")
            .build();

        self.run_negative(
            "invalid_file_type",
            "Request with unknown file_type is rejected",
            params,
        )
        .await
    }

    async fn run_negative(
        &self,
        label: &str,
        description: &str,
        params: QueryParams,
    ) -> CaseOutcome {
        info!(case = label, "processing negative case");

        let started = Instant::now();
        let response = match self
            .client
            .post_query_authorized(&self.settings.endpoint, &params)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(case = label, error = %err, "request failed");
                return errored_outcome(label.to_string(), description.to_string(), started, err);
            }
        };

        let checks = assertions::evaluate_all(&assertions::validation_error_checks(), &response);
        let status_ok = response.status == 422;
        let passed = status_ok && checks.iter().all(|c| c.passed);
        let error = (!status_ok).then(|| {
            format!(
                "expected status 422, got {} {}",
                response.status, response.status_text
            )
        });

        report_case(label, passed, &response);
        CaseOutcome {
            label: label.to_string(),
            description: description.to_string(),
            passed,
            status_code: Some(response.status),
            duration_ms: response.duration_ms,
            checks,
            error,
        }
    }

    /// Run every registered case plus the negative cases.
    pub async fn run_all(&self, mode: RunMode) -> Vec<CaseOutcome> {
        let cases: Vec<TestCase> = self.registry.cases().to_vec();
        let mut outcomes = self.run_cases(cases, mode).await;
        outcomes.push(self.run_negative_missing_file_url().await);
        outcomes.push(self.run_negative_invalid_file_type().await);
        outcomes
    }

    /// Run only the cases named by `ids`, in the given order.
    ///
    /// Fails before any request is sent if an id is not registered.
    pub async fn run_selected(
        &self,
        ids: &[String],
        mode: RunMode,
    ) -> Result<Vec<CaseOutcome>, IntakeError> {
        let mut cases = Vec::with_capacity(ids.len());
        for id in ids {
            cases.push(self.registry.get(id)?.clone());
        }
        Ok(self.run_cases(cases, mode).await)
    }

    async fn run_cases(&self, cases: Vec<TestCase>, mode: RunMode) -> Vec<CaseOutcome> {
        match mode {
            RunMode::Serial => {
                let mut outcomes = Vec::with_capacity(cases.len());
                for case in &cases {
                    outcomes.push(self.run_case(case).await);
                }
                outcomes
            }
            RunMode::Parallel => {
                let mut tasks = JoinSet::new();
                for (index, case) in cases.into_iter().enumerate() {
                    let runner = self.clone();
                    tasks.spawn(async move { (index, runner.run_case(&case).await) });
                }

                let mut indexed = Vec::new();
                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok(entry) => indexed.push(entry),
                        Err(err) => warn!(error = %err, "case task aborted"),
                    }
                }

                // Declaration order is kept for report readability.
                indexed.sort_by_key(|(index, _)| *index);
                indexed.into_iter().map(|(_, outcome)| outcome).collect()
            }
        }
    }
}

fn errored_outcome(
    label: String,
    description: String,
    started: Instant,
    err: IntakeError,
) -> CaseOutcome {
    CaseOutcome {
        label,
        description,
        passed: false,
        status_code: None,
        duration_ms: started.elapsed().as_millis() as u64,
        checks: Vec::new(),
        error: Some(err.to_string()),
    }
}

fn report_case(label: &str, passed: bool, response: &ApiResponse) {
    if passed {
        info!(
            case = label,
            status = response.status,
            elapsed_ms = response.duration_ms,
            "passed"
        );
    } else {
        warn!(
            case = label,
            status = response.status,
            elapsed_ms = response.duration_ms,
            "failed"
        );
    }
}
