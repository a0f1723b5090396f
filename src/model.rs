use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConsoleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(ConsoleError::MalformedInput(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

/// Request body for `POST /start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target_url: String,
    pub num_users: u32,
    #[serde(rename = "duration")]
    pub duration_seconds: u32,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "empty_payload")]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub chaos_mode: bool,
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Final summary returned by `POST /start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub avg_latency: f64,
    pub error_rate: f64,
    pub throughput: f64,
    pub total_requests: u64,
    pub health_score: u32,
    #[serde(default)]
    pub diagnosis: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_stddev: Option<f64>,
}

fn lenient_method<'de, D>(deserializer: D) -> Result<Option<HttpMethod>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|m| m.parse().ok()))
}

/// One entry of `GET /runs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRun {
    pub run_id: String,
    pub url: String,
    pub users: u32,
    pub duration: u32,
    pub avg_latency: f64,
    pub error_rate: f64,
    pub throughput: f64,
    pub health_score: u32,
    /// Older backends do not record the method; unrecognised values read as
    /// absent rather than failing the whole list.
    #[serde(
        default,
        deserialize_with = "lenient_method",
        skip_serializing_if = "Option::is_none"
    )]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_stddev: Option<f64>,
}

/// The subset of a completed run that diagnosis looks at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunMetrics {
    pub avg_latency: f64,
    pub error_rate: f64,
    pub throughput: f64,
    pub health_score: u32,
}

impl RunResult {
    pub fn metrics(&self) -> RunMetrics {
        RunMetrics {
            avg_latency: self.avg_latency,
            error_rate: self.error_rate,
            throughput: self.throughput,
            health_score: self.health_score,
        }
    }
}

impl HistoricalRun {
    pub fn metrics(&self) -> RunMetrics {
        RunMetrics {
            avg_latency: self.avg_latency,
            error_rate: self.error_rate,
            throughput: self.throughput,
            health_score: self.health_score,
        }
    }
}
