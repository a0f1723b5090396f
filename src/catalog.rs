use std::collections::HashMap;
use tracing::{info, warn};

use crate::api::LoadTestApi;
use crate::error::ConsoleError;
use crate::model::HistoricalRun;

/// In-memory list of past runs, replaced wholesale on every refresh.
#[derive(Debug, Default)]
pub struct RunCatalog {
    runs: Vec<HistoricalRun>,
    index: HashMap<String, usize>,
    loaded: bool,
}

impl RunCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly fetched snapshot.
    pub fn replace(&mut self, runs: Vec<HistoricalRun>) {
        let mut index = HashMap::with_capacity(runs.len());
        for (pos, run) in runs.iter().enumerate() {
            // First occurrence wins if the service ever repeats an id.
            index.entry(run.run_id.clone()).or_insert(pos);
        }
        self.runs = runs;
        self.index = index;
        self.loaded = true;
    }

    pub fn find_by_id(&self, run_id: &str) -> Result<&HistoricalRun, ConsoleError> {
        self.index
            .get(run_id)
            .and_then(|pos| self.runs.get(*pos))
            .ok_or_else(|| ConsoleError::NotFound(run_id.to_string()))
    }

    pub fn runs(&self) -> &[HistoricalRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Whether any refresh has succeeded yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Fetch `/runs` and replace the catalog. On failure the previous contents
/// are left as they were.
pub async fn refresh(
    api: &dyn LoadTestApi,
    catalog: &tokio::sync::RwLock<RunCatalog>,
) -> Result<Vec<HistoricalRun>, ConsoleError> {
    match api.list_runs().await {
        Ok(runs) => {
            info!("Loaded past runs: {} runs", runs.len());
            catalog.write().await.replace(runs.clone());
            Ok(runs)
        }
        Err(e) => {
            warn!("Error loading past runs: {}", e);
            Err(e)
        }
    }
}
