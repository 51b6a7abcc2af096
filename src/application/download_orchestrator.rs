use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::staging::StagingStore;
use crate::{
    api::MediaFetcher,
    domain::{AppError, CompletionMap, Item, ItemState, RunOutcome, RunReport},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestratorOptions {
    /// Upper bound on passes, even while progress is being made.
    pub max_passes: Option<usize>,
}

/// Drives every item to its final path, one download at a time.
///
/// Each pass visits the items still marked incomplete, in feed order. A pass
/// that completes nothing ends the run as stalled instead of retrying forever.
pub struct DownloadOrchestrator<F> {
    fetcher: F,
    store: StagingStore,
    items: Vec<Item>,
    completion: CompletionMap,
    options: OrchestratorOptions,
}

impl<F: MediaFetcher> DownloadOrchestrator<F> {
    pub fn new(
        fetcher: F,
        store: StagingStore,
        items: Vec<Item>,
        options: OrchestratorOptions,
    ) -> Self {
        let completion = CompletionMap::new(&items);
        Self {
            fetcher,
            store,
            items,
            completion,
            options,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn completion(&self) -> &CompletionMap {
        &self.completion
    }

    /// Run passes until nothing is pending or a pass makes no progress.
    ///
    /// Only a failed commit is an error; per-item download failures are
    /// retried on the next pass and surface as [`RunOutcome::Stalled`] if they
    /// never succeed.
    pub async fn run(&mut self) -> Result<(RunOutcome, RunReport), AppError> {
        let total = self.items.len();
        let mut report = RunReport {
            total,
            ..Default::default()
        };

        let outcome = loop {
            let remaining = self.completion.remaining();
            if remaining == 0 {
                break RunOutcome::Completed {
                    downloaded: report.downloaded,
                    skipped: report.skipped,
                };
            }
            if self
                .options
                .max_passes
                .is_some_and(|max| report.passes >= max)
            {
                warn!(passes = report.passes, "Pass limit reached");
                break self.stalled();
            }

            info!("Remaining files: {}/{}", remaining, total);
            report.passes += 1;
            self.run_pass(&mut report).await?;

            if self.completion.remaining() == remaining {
                warn!(
                    pass = report.passes,
                    remaining, "No file completed during this pass, giving up"
                );
                break self.stalled();
            }
        };

        report.pending = self
            .completion
            .pending_items(&self.items)
            .into_iter()
            .map(|item| item.title.clone())
            .collect();

        report.staging_removed = match self.store.cleanup_if_empty().await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(
                    path = %self.store.staging_dir().display(),
                    error = %e,
                    "Could not remove temp directory"
                );
                false
            }
        };

        Ok((outcome, report))
    }

    async fn run_pass(&mut self, report: &mut RunReport) -> Result<(), AppError> {
        let total = self.items.len();
        let pending: Vec<Item> = self
            .completion
            .pending_items(&self.items)
            .into_iter()
            .cloned()
            .collect();

        for item in &pending {
            trace_state(item, ItemState::Pending);

            if self.store.is_committed(item).await {
                info!("Skipping file {}", self.store.final_path(item).display());
                self.completion.mark_complete(item);
                report.skipped += 1;
                continue;
            }

            trace_state(item, ItemState::Downloading);
            match self.download(item).await {
                Ok(bytes) => {
                    self.store.commit(item).await?;
                    self.completion.mark_complete(item);
                    report.downloaded += 1;
                    trace_state(item, ItemState::Committed);
                    info!(
                        bytes,
                        "Downloaded file {}/{} {}",
                        total - self.completion.remaining(),
                        total,
                        item.title
                    );
                }
                Err(e) => {
                    trace_state(item, ItemState::FailedThisPass);
                    warn!(
                        title = %item.title,
                        url = %item.source_url,
                        ext = %item.file_extension,
                        error = %e,
                        "Error downloading file"
                    );
                }
            }
        }

        Ok(())
    }

    /// Fetch one item into its staging file and close it.
    async fn download(&self, item: &Item) -> Result<u64, String> {
        let mut file = self
            .store
            .create_staging_file(item)
            .await
            .map_err(|e| format!("Failed to create temp file: {e}"))?;

        let bytes = self
            .fetcher
            .download_to(&item.source_url, &mut file)
            .await
            .map_err(|e| e.to_string())?;

        file.flush()
            .await
            .map_err(|e| format!("Failed to flush temp file: {e}"))?;
        file.sync_all()
            .await
            .map_err(|e| format!("Failed to sync temp file: {e}"))?;

        Ok(bytes)
    }

    fn stalled(&self) -> RunOutcome {
        RunOutcome::Stalled {
            pending: self
                .completion
                .pending_items(&self.items)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

fn trace_state(item: &Item, state: ItemState) {
    debug!(title = %item.title, ?state, "item state");
}
