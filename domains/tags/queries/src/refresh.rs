use std::sync::Arc;

use sql_connection::SqlConnect;
use tag_dao::{PostgresTagSummaryStore, TagSummaryStore};
use tracing::{error, info, instrument};

/// How often the usage summary is rebuilt from the base tables.
const REFRESH_INTERVAL_SECS: u64 = 900;

/// Periodically rebuilds the tag usage summary so top-tags and heatmap
/// reads stay bounded-stale rather than unbounded-stale.
pub struct SummaryRefreshTask {
    summary_store: Arc<dyn TagSummaryStore>,
}

impl SummaryRefreshTask {
    pub fn new(db: SqlConnect) -> Self {
        Self {
            summary_store: Arc::new(PostgresTagSummaryStore::new(db)),
        }
    }

    pub fn with_custom_components(
        summary_store: Arc<dyn TagSummaryStore>,
    ) -> Self {
        Self { summary_store }
    }

    #[instrument(skip(self))]
    pub async fn run_periodic_refresh(&self) {
        let mut interval = tokio::time::interval(
            tokio::time::Duration::from_secs(REFRESH_INTERVAL_SECS),
        );

        loop {
            interval.tick().await;

            if let Err(e) = self.summary_store.refresh().await {
                error!("Failed to refresh tag usage summary: {}", e);
            }
            else {
                info!("Completed periodic tag usage summary refresh");
            }
        }
    }
}
