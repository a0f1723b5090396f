use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::model::{HistoricalRun, RunConfig, RunResult};

/// The remote load-testing service.
///
/// Futures are `'static` so callers can hand them to `tokio::spawn` without
/// holding a borrow of the client.
pub trait LoadTestApi: Send + Sync {
    /// `POST /start`: runs the test to completion on the server.
    fn start_test(&self, config: RunConfig) -> BoxFuture<'static, Result<RunResult, ConsoleError>>;

    /// `GET /runs`
    fn list_runs(&self) -> BoxFuture<'static, Result<Vec<HistoricalRun>, ConsoleError>>;

    /// `GET /export/{run_id}` for one run, `GET /export` for all of them.
    fn export(&self, run_id: Option<String>) -> BoxFuture<'static, Result<Bytes, ConsoleError>>;
}

pub struct HttpLoadTestApi {
    client: reqwest::Client,
    base: String,
}

impl HttpLoadTestApi {
    pub fn new(client: reqwest::Client, config: &ConsoleConfig) -> Self {
        Self {
            client,
            base: config.api_url(""),
        }
    }

    /// Append `segments` to the base path. Each segment is percent-encoded,
    /// so a run id can never add path levels, a query or a fragment.
    fn url(&self, segments: &[&str]) -> Result<String, ConsoleError> {
        let mut url = url::Url::parse(&self.base).map_err(|e| {
            ConsoleError::MalformedInput(format!("invalid API base {:?}: {e}", self.base))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ConsoleError::MalformedInput(format!("API base {:?} cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }
}

/// Run ids are opaque, but dot segments and the empty string would name a
/// different resource upstream.
fn run_id_segment(run_id: &str) -> Result<&str, ConsoleError> {
    match run_id {
        "" | "." | ".." => Err(ConsoleError::MalformedInput(format!(
            "invalid run id {run_id:?}"
        ))),
        id => Ok(id),
    }
}

/// Turn a non-2xx response into `ServerError`, keeping the body text.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ConsoleError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!("Remote service returned {}: {}", status, body);
    Err(ConsoleError::ServerError {
        status: status.as_u16(),
        body,
    })
}

impl LoadTestApi for HttpLoadTestApi {
    fn start_test(&self, config: RunConfig) -> BoxFuture<'static, Result<RunResult, ConsoleError>> {
        let client = self.client.clone();
        let url = self.url(&["start"]);
        async move {
            let url = url?;
            debug!("POST {} for {}", url, config.target_url);
            let resp = client.post(&url).json(&config).send().await?;
            let resp = check_status(resp).await?;
            let result = resp.json::<RunResult>().await?;
            Ok(result)
        }
        .boxed()
    }

    fn list_runs(&self) -> BoxFuture<'static, Result<Vec<HistoricalRun>, ConsoleError>> {
        let client = self.client.clone();
        let url = self.url(&["runs"]);
        async move {
            let url = url?;
            let resp = client.get(&url).send().await?;
            let resp = check_status(resp).await?;
            let runs = resp.json::<Vec<HistoricalRun>>().await?;
            debug!("Fetched {} past runs", runs.len());
            Ok(runs)
        }
        .boxed()
    }

    fn export(&self, run_id: Option<String>) -> BoxFuture<'static, Result<Bytes, ConsoleError>> {
        let client = self.client.clone();
        let url = match run_id.as_deref() {
            Some(id) => run_id_segment(id).and_then(|id| self.url(&["export", id])),
            None => self.url(&["export"]),
        };
        async move {
            let url = url?;
            let resp = client.get(&url).send().await?;
            let resp = check_status(resp).await?;
            Ok(resp.bytes().await?)
        }
        .boxed()
    }
}
