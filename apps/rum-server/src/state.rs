//! Application state for the RUM server

use async_trait::async_trait;
use lab_analysis::{AnalysisError, AnalysisReport, Analyzer, SessionLauncher};
use std::sync::Arc;

use crate::broadcast::RumBroadcaster;
use crate::store::RumStore;

/// Anything that can produce a lab report for a URL
#[async_trait]
pub trait LabAnalyzer: Send + Sync {
    async fn analyze(&self, url: &str) -> Result<AnalysisReport, AnalysisError>;
}

#[async_trait]
impl<L> LabAnalyzer for Analyzer<L>
where
    L: SessionLauncher + 'static,
{
    async fn analyze(&self, url: &str) -> Result<AnalysisReport, AnalysisError> {
        Analyzer::analyze(self, url).await
    }
}

pub struct AppState {
    pub store: Arc<dyn RumStore>,
    pub feed: RumBroadcaster,
    pub analyzer: Arc<dyn LabAnalyzer>,
}

impl AppState {
    pub fn new(store: Arc<dyn RumStore>, analyzer: Arc<dyn LabAnalyzer>) -> Self {
        Self {
            store,
            feed: RumBroadcaster::new(),
            analyzer,
        }
    }
}
