use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::ConsoleError;
use crate::model::{HttpMethod, RunConfig};

/// Raw form fields as typed by the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormInput {
    pub target_url: String,
    pub num_users: String,
    pub duration: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub payload: String,
}

/// A validated config plus any warnings raised while substituting defaults.
#[derive(Debug, Clone)]
pub struct ParsedForm {
    pub config: RunConfig,
    pub warnings: Vec<String>,
}

fn parse_positive(field: &str, raw: &str) -> Result<u32, ConsoleError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConsoleError::MalformedInput(format!(
            "{field} must be a positive integer, got {raw:?}"
        ))),
    }
}

fn parse_target(raw: &str) -> Result<String, ConsoleError> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ConsoleError::MalformedInput(format!("invalid target URL {trimmed:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ConsoleError::MalformedInput(format!(
            "target URL must be http or https, got {other}"
        ))),
    }
}

/// Blank input yields the default silently; invalid JSON yields the default
/// and a warning.
fn parse_json_or_default<T>(field: &str, raw: &str, warnings: &mut Vec<String>) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    if raw.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid JSON in {}: {}", field, e);
            warnings.push(format!("Invalid JSON format in {field}, using an empty value"));
            T::default()
        }
    }
}

impl FormInput {
    pub fn parse(&self, chaos_mode: bool) -> Result<ParsedForm, ConsoleError> {
        let target_url = parse_target(&self.target_url)?;
        let num_users = parse_positive("num_users", &self.num_users)?;
        let duration_seconds = parse_positive("duration", &self.duration)?;
        let method = if self.method.trim().is_empty() {
            HttpMethod::default()
        } else {
            self.method.parse()?
        };

        let mut warnings = Vec::new();
        let headers: BTreeMap<String, String> =
            parse_json_or_default("headers", &self.headers, &mut warnings);
        let payload: serde_json::Map<String, serde_json::Value> =
            parse_json_or_default("payload", &self.payload, &mut warnings);

        Ok(ParsedForm {
            config: RunConfig {
                target_url,
                num_users,
                duration_seconds,
                method,
                headers,
                payload: serde_json::Value::Object(payload),
                chaos_mode,
            },
            warnings,
        })
    }
}
