pub mod download_orchestrator;
pub mod staging;

pub use download_orchestrator::{DownloadOrchestrator, OrchestratorOptions};
pub use staging::StagingStore;

use tracing::info;

use crate::{
    api::FeedSource,
    domain::{AppError, Item},
    feed::parse_items,
};

/// Fetch and parse a feed, rejecting feeds that list nothing to download.
pub async fn load_items(source: &dyn FeedSource, url: &str) -> Result<Vec<Item>, AppError> {
    let text = source
        .fetch_feed(url)
        .await
        .map_err(|source| AppError::FeedUnavailable {
            url: url.to_string(),
            source,
        })?;

    let items = parse_items(&text).map_err(|source| AppError::FeedMalformed {
        url: url.to_string(),
        source,
    })?;

    if items.is_empty() {
        return Err(AppError::NoItems {
            url: url.to_string(),
        });
    }

    info!("Downloading {} files", items.len());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::api::{ApiError, Result as ApiResult};

    struct StaticFeed(Option<&'static str>);

    #[async_trait]
    impl FeedSource for StaticFeed {
        async fn fetch_feed(&self, url: &str) -> ApiResult<String> {
            self.0.map(str::to_string).ok_or_else(|| ApiError::Status {
                url: url.to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            })
        }
    }

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title><link>http://x</link><description>d</description>
<item><title>ep1</title><enclosure url="http://x/1.mp3" length="1" type="audio/mpeg"/></item>
<item><title>ep2</title><enclosure url="http://x/2.mp3" length="1" type="audio/mpeg"/></item>
</channel></rss>"#;

    const EMPTY_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title><link>http://x</link><description>d</description>
</channel></rss>"#;

    #[tokio::test]
    async fn test_load_items() {
        let items = load_items(&StaticFeed(Some(FEED)), "http://x/feed")
            .await
            .unwrap();
        assert_eq!(
            items,
            vec![
                Item::new("ep1", "mp3", "http://x/1.mp3"),
                Item::new("ep2", "mp3", "http://x/2.mp3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_items_reports_unreachable_feed() {
        let err = load_items(&StaticFeed(None), "http://x/feed")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FeedUnavailable { ref url, .. } if url == "http://x/feed"));
        assert!(err.to_string().contains("http://x/feed"));
    }

    #[tokio::test]
    async fn test_load_items_reports_no_files() {
        let err = load_items(&StaticFeed(Some(EMPTY_FEED)), "http://x/feed")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoItems { .. }));
        assert_eq!(err.exit_code(), 6);
    }

    #[tokio::test]
    async fn test_load_items_reports_malformed_feed() {
        let err = load_items(&StaticFeed(Some("<html>")), "http://x/feed")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FeedMalformed { .. }));
    }
}
