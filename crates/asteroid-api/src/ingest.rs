//! Feed ingestion
//!
//! Pulls a date window from the feed, validates and classifies every record,
//! and upserts the survivors. Optionally repeats on a fixed interval.

use asteroid_common::{Error, InvalidInputError, Result};
use chrono::{Duration as DateDuration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::feed::{NeoFeed, MAX_FEED_WINDOW_DAYS};
use crate::storage::Storage;

/// Outcome of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records stored (inserted + updated)
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Records rejected by validation
    pub skipped: usize,
    /// Count reported by the feed itself
    pub element_count: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct Ingestor {
    feed: Arc<dyn NeoFeed>,
    storage: Arc<dyn Storage>,
}

impl Ingestor {
    pub fn new(feed: Arc<dyn NeoFeed>, storage: Arc<dyn Storage>) -> Self {
        Self { feed, storage }
    }

    /// Ingest today through today + `days_ahead`.
    pub async fn ingest(&self, days_ahead: i64) -> Result<IngestReport> {
        let start_date = Utc::now().date_naive();
        self.ingest_window(start_date, days_ahead).await
    }

    /// Ingest `start_date` through `start_date + days_ahead`.
    pub async fn ingest_window(
        &self,
        start_date: NaiveDate,
        days_ahead: i64,
    ) -> Result<IngestReport> {
        if !(0..=MAX_FEED_WINDOW_DAYS).contains(&days_ahead) {
            return Err(InvalidInputError::FeedWindowOutOfRange {
                days: days_ahead,
                max: MAX_FEED_WINDOW_DAYS,
            }
            .into());
        }
        let end_date = start_date + DateDuration::days(days_ahead);

        let feed = self
            .feed
            .fetch(start_date, end_date)
            .await
            .map_err(|e| Error::Feed(format!("{:#}", e)))?;

        let mut report = IngestReport {
            processed: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            element_count: feed.element_count,
            start_date,
            end_date,
        };
        let ingested_at = Utc::now();

        for raw in feed.records() {
            let label = raw.reference_id().unwrap_or("<unknown>").to_string();
            let neo = match raw.into_near_earth_object(ingested_at) {
                Ok(neo) => neo,
                Err(e) => {
                    warn!("Skipping feed record {}: {}", label, e);
                    report.skipped += 1;
                    continue;
                }
            };

            if self.storage.put_asteroid(&neo).await? {
                report.inserted += 1;
            } else {
                report.updated += 1;
            }
            report.processed += 1;
        }

        info!(
            "Ingested {} asteroids ({} new, {} updated, {} skipped) for {} to {}",
            report.processed,
            report.inserted,
            report.updated,
            report.skipped,
            report.start_date,
            report.end_date
        );

        Ok(report)
    }

    /// Re-run ingestion forever, surviving individual failures.
    pub async fn run_refresh_loop(self: Arc<Self>, interval_secs: u64, days_ahead: i64) {
        info!(
            "Starting feed refresher (every {} seconds, {} days ahead)",
            interval_secs, days_ahead
        );

        loop {
            if let Err(e) = self.ingest(days_ahead).await {
                error!("Feed refresh failed: {:#}", e);
            }

            sleep(Duration::from_secs(interval_secs)).await;
        }
    }
}
