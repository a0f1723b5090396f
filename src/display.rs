//! Text projections of runs and results for the dashboard. Rendering is
//! one-way: the catalog, not these strings, is the source of truth.

use serde::Serialize;

use crate::config::URL_DISPLAY_LIMIT;
use crate::diagnosis::HealthStatus;
use crate::error::ConsoleError;
use crate::model::{HistoricalRun, HttpMethod, RunResult};

pub fn format_latency(secs: f64) -> String {
    format!("{secs:.3}s")
}

/// Fraction in [0,1] shown as a percentage with one decimal.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

pub fn format_throughput(per_sec: f64) -> String {
    format!("{per_sec:.1}")
}

pub fn truncate_url(url: &str) -> String {
    if url.chars().count() > URL_DISPLAY_LIMIT {
        let head: String = url.chars().take(URL_DISPLAY_LIMIT).collect();
        format!("{head}...")
    } else {
        url.to_string()
    }
}

fn parse_number(text: &str, suffix: char) -> Result<f64, ConsoleError> {
    let trimmed = text.trim();
    trimmed
        .strip_suffix(suffix)
        .unwrap_or(trimmed)
        .trim()
        .parse::<f64>()
        .map_err(|_| ConsoleError::MalformedInput(format!("not a number: {text:?}")))
}

/// Inverse of [`format_latency`], to 3 decimals.
pub fn parse_latency(text: &str) -> Result<f64, ConsoleError> {
    parse_number(text, 's')
}

/// Inverse of [`format_percent`]; returns a fraction.
pub fn parse_percent(text: &str) -> Result<f64, ConsoleError> {
    parse_number(text, '%').map(|pct| pct / 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRow {
    pub run_id: String,
    pub url: String,
    pub users: String,
    pub duration: String,
    pub avg_latency: String,
    pub error_rate: String,
    pub throughput: String,
    pub health_score: String,
    pub status: HealthStatus,
    pub status_text: &'static str,
}

impl RunRow {
    pub fn render(run: &HistoricalRun) -> Self {
        let status = HealthStatus::from_score(run.health_score);
        Self {
            run_id: run.run_id.clone(),
            url: truncate_url(&run.url),
            users: run.users.to_string(),
            duration: format!("{}s", run.duration),
            avg_latency: format_latency(run.avg_latency),
            error_rate: format_percent(run.error_rate),
            throughput: format_throughput(run.throughput),
            health_score: run.health_score.to_string(),
            status,
            status_text: status.label(),
        }
    }
}

/// How a past run was configured, for the detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfiguration {
    pub users: u32,
    pub duration: String,
    pub method: HttpMethod,
    /// Reported by the backend when available, otherwise
    /// `round(throughput * duration)`.
    pub estimated_total_requests: u64,
}

impl RunConfiguration {
    pub fn render(run: &HistoricalRun) -> Self {
        Self {
            users: run.users,
            duration: format!("{} seconds", run.duration),
            method: run.method.unwrap_or_default(),
            estimated_total_requests: run
                .total_requests
                .unwrap_or_else(|| estimate_total_requests(run.throughput, run.duration)),
        }
    }
}

/// Non-finite or negative throughput estimates to zero.
pub fn estimate_total_requests(throughput: f64, duration: u32) -> u64 {
    let estimate = (throughput * f64::from(duration)).round();
    if estimate.is_finite() && estimate > 0.0 {
        estimate as u64
    } else {
        0
    }
}

/// What the table shows in place of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunTable {
    Rows { rows: Vec<RunRow> },
    Empty { message: String },
    Error { message: String },
}

impl RunTable {
    pub fn from_runs(runs: &[HistoricalRun]) -> Self {
        if runs.is_empty() {
            RunTable::Empty {
                message: "No past runs found".to_string(),
            }
        } else {
            RunTable::Rows {
                rows: runs.iter().map(RunRow::render).collect(),
            }
        }
    }

    pub fn from_error(err: &ConsoleError) -> Self {
        RunTable::Error {
            message: format!("Error loading past runs: {err}"),
        }
    }
}

/// The result panel shown after a completed test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub avg_latency: String,
    pub error_rate: String,
    pub throughput: String,
    pub total_requests: String,
    pub health_score: u32,
    pub health_status: HealthStatus,
    pub diagnosis: Vec<String>,
}

impl ResultSummary {
    pub fn render(result: &RunResult) -> Self {
        Self {
            avg_latency: format!("{:.3}", result.avg_latency),
            error_rate: format_percent(result.error_rate),
            throughput: format_throughput(result.throughput),
            total_requests: result.total_requests.to_string(),
            health_score: result.health_score,
            health_status: HealthStatus::from_score(result.health_score),
            diagnosis: result.diagnosis.clone(),
        }
    }
}
