//! # Run Reports
//!
//! Aggregates case outcomes into a summary with latency statistics and
//! renders it for humans (text) or CI (JSON).

use std::fs;
use std::path::Path;

use hdrhistogram::Histogram;
use serde::Serialize;

use crate::error::IntakeError;
use crate::runner::CaseOutcome;

/// Output format for rendered reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Latency aggregation over all case durations, in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct LatencyStats {
    pub min_ms: u64,
    pub max_ms: u64,
    pub mean_ms: f64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

impl LatencyStats {
    fn from_outcomes(outcomes: &[CaseOutcome]) -> Option<Self> {
        let mut histogram = Histogram::<u64>::new(3).ok()?;
        for outcome in outcomes {
            // 0 is below the histogram's resolution; clamp to 1ms.
            let _ = histogram.record(outcome.duration_ms.max(1));
        }
        if histogram.len() == 0 {
            return None;
        }

        Some(Self {
            min_ms: histogram.min(),
            max_ms: histogram.max(),
            mean_ms: histogram.mean(),
            p50_ms: histogram.value_at_quantile(0.50),
            p95_ms: histogram.value_at_quantile(0.95),
            p99_ms: histogram.value_at_quantile(0.99),
        })
    }
}

/// Summary of one suite run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub latency: Option<LatencyStats>,
    pub outcomes: Vec<CaseOutcome>,
}

impl RunReport {
    pub fn from_outcomes(outcomes: Vec<CaseOutcome>, duration_ms: u64) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();
        Self {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            duration_ms,
            latency: LatencyStats::from_outcomes(&outcomes),
            outcomes,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, IntakeError> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "intake suite: {} passed, {} failed of {} in {}ms",
            self.passed, self.failed, self.total, self.duration_ms
        ));

        for outcome in &self.outcomes {
            let marker = if outcome.passed { "PASS" } else { "FAIL" };
            let status = match outcome.status_code {
                Some(code) => code.to_string(),
                None => "---".to_string(),
            };
            lines.push(format!(
                "  [{marker}] {:<22} {status:>4}  {:>6}ms  {}",
                outcome.label, outcome.duration_ms, outcome.description
            ));

            if let Some(error) = &outcome.error {
                lines.push(format!("         {error}"));
            }
            for check in outcome.checks.iter().filter(|c| !c.passed) {
                lines.push(format!("         {}", check.message));
            }
        }

        if let Some(latency) = &self.latency {
            lines.push(format!(
                "  latency: min {}ms / mean {:.1}ms / p50 {}ms / p95 {}ms / p99 {}ms / max {}ms",
                latency.min_ms,
                latency.mean_ms,
                latency.p50_ms,
                latency.p95_ms,
                latency.p99_ms,
                latency.max_ms
            ));
        }

        lines.join("\n")
    }

    /// Write the rendered report to a file, for CI artifact collection.
    pub fn write_to(&self, path: &Path, format: OutputFormat) -> Result<(), IntakeError> {
        let rendered = self.render(format)?;
        fs::write(path, rendered).map_err(|err| IntakeError::Io {
            action: "write report file",
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(label: &str, passed: bool, duration_ms: u64) -> CaseOutcome {
        CaseOutcome {
            label: label.to_string(),
            description: format!("{label} case"),
            passed,
            status_code: Some(if passed { 200 } else { 500 }),
            duration_ms,
            checks: Vec::new(),
            error: (!passed).then(|| "expected status in [200, 202], got 500".to_string()),
        }
    }

    #[test]
    fn counts_passed_and_failed() {
        let report = RunReport::from_outcomes(
            vec![
                outcome("community_001", true, 40),
                outcome("zoning_001", false, 60),
                outcome("image_001", true, 50),
            ],
            180,
        );

        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn empty_run_has_no_latency() {
        let report = RunReport::from_outcomes(Vec::new(), 0);
        assert!(report.latency.is_none());
        assert!(report.all_passed());
    }

    #[test]
    fn latency_stats_span_min_and_max() {
        let outcomes: Vec<CaseOutcome> = (1..=100)
            .map(|i| outcome(&format!("case_{i:03}"), true, i))
            .collect();
        let report = RunReport::from_outcomes(outcomes, 5_000);

        let latency = report.latency.unwrap();
        assert_eq!(latency.min_ms, 1);
        assert!(latency.max_ms >= 100);
        assert!(latency.p50_ms >= latency.min_ms);
        assert!(latency.p99_ms >= latency.p95_ms);
    }

    #[test]
    fn text_render_marks_failures() {
        let report = RunReport::from_outcomes(
            vec![
                outcome("community_001", true, 40),
                outcome("zoning_001", false, 60),
            ],
            120,
        );

        let text = report.render(OutputFormat::Text).unwrap();
        assert!(text.contains("[PASS] community_001"));
        assert!(text.contains("[FAIL] zoning_001"));
        assert!(text.contains("1 passed, 1 failed of 2"));
        assert!(text.contains("expected status in [200, 202]"));
    }

    #[test]
    fn json_render_round_trips() {
        let report = RunReport::from_outcomes(vec![outcome("community_001", true, 40)], 40);
        let raw = report.render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["total"], 1);
        assert_eq!(value["outcomes"][0]["label"], "community_001");
        assert_eq!(value["outcomes"][0]["passed"], true);
    }

    #[test]
    fn write_to_persists_the_rendered_report() {
        let report = RunReport::from_outcomes(vec![outcome("community_001", true, 40)], 40);
        let path = std::env::temp_dir().join(format!("intakeman-report-{}.json", std::process::id()));

        report.write_to(&path, OutputFormat::Json).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("community_001"));

        let _ = fs::remove_file(&path);
    }
}
