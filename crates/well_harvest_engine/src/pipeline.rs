use std::time::Duration;

use futures_util::{stream, StreamExt};
use harvest_logging::{harvest_info, harvest_warn};
use tokio_util::sync::CancellationToken;
use well_harvest_core::{normalize, DiscoveryRecord, NormalizeContext, NormalizedRecord};

use crate::detail::{DetailFetcher, FetchFailure};
use crate::pacing::Pacer;
use crate::progress::{NullSink, ProgressSink};
use crate::PipelineEvent;

#[derive(Debug, Clone)]
pub struct EnrichSettings {
    /// Detail fetches in flight at once. Output order never depends on it.
    pub concurrency: usize,
    pub pacing_delay: Duration,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            pacing_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnrichmentReport {
    /// Normalized records in input order, failed fetches left out.
    pub records: Vec<NormalizedRecord>,
    pub failures: Vec<FetchFailure>,
    /// Discovery records rejected by the filter.
    pub filtered_out: usize,
    /// Records never attempted because the run was cancelled.
    pub skipped_by_cancel: usize,
}

impl EnrichmentReport {
    pub fn was_cancelled(&self) -> bool {
        self.skipped_by_cancel > 0
    }
}

enum Outcome {
    Normalized(NormalizedRecord),
    Failed(FetchFailure),
    Skipped,
}

/// Filters discovery records, then fetches and normalizes each survivor.
pub struct Enricher<'a> {
    fetcher: &'a dyn DetailFetcher,
    settings: EnrichSettings,
    sink: &'a dyn ProgressSink,
    cancel: CancellationToken,
}

impl<'a> Enricher<'a> {
    pub fn new(fetcher: &'a dyn DetailFetcher, settings: EnrichSettings) -> Self {
        Self {
            fetcher,
            settings,
            sink: &NullSink,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.sink = sink;
        self
    }

    /// Checked before each record; records already in flight complete.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run<P>(&self, discovered: &[DiscoveryRecord], predicate: P) -> EnrichmentReport
    where
        P: Fn(&DiscoveryRecord) -> bool,
    {
        let selected: Vec<&DiscoveryRecord> = discovered.iter().filter(|r| predicate(r)).collect();
        let filtered_out = discovered.len() - selected.len();
        harvest_info!(
            "Enriching {} of {} discovered records",
            selected.len(),
            discovered.len()
        );

        let pacer = Pacer::new(self.settings.pacing_delay);
        let outcomes: Vec<Outcome> = stream::iter(selected.into_iter().enumerate())
            .map(|(index, record)| self.enrich_one(index, record, &pacer))
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut report = EnrichmentReport {
            filtered_out,
            ..EnrichmentReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Normalized(record) => report.records.push(record),
                Outcome::Failed(failure) => report.failures.push(failure),
                Outcome::Skipped => report.skipped_by_cancel += 1,
            }
        }

        if report.was_cancelled() {
            harvest_warn!(
                "Enrichment cancelled; {} records left unprocessed",
                report.skipped_by_cancel
            );
        }
        harvest_info!(
            "Enrichment finished: {} normalized, {} failed, {} filtered out",
            report.records.len(),
            report.failures.len(),
            report.filtered_out
        );
        report
    }

    async fn enrich_one(&self, index: usize, record: &DiscoveryRecord, pacer: &Pacer) -> Outcome {
        if self.cancel.is_cancelled() {
            return Outcome::Skipped;
        }
        pacer.acquire().await;
        if self.cancel.is_cancelled() {
            pacer.release();
            return Outcome::Skipped;
        }

        let result = self.fetcher.fetch_detail(record.link()).await;
        pacer.release();

        match result {
            Ok(raw) => {
                self.sink.emit(PipelineEvent::DetailFetched {
                    index,
                    reference: record.link().to_string(),
                    fields: raw.len(),
                });
                Outcome::Normalized(normalize(
                    &raw,
                    NormalizeContext {
                        external_key: record.well_id(),
                        county: record.county(),
                    },
                ))
            }
            Err(failure) => {
                harvest_warn!("Skipping {}: {}", failure.reference, failure.cause);
                self.sink.emit(PipelineEvent::DetailFailed {
                    index,
                    reference: failure.reference.clone(),
                    cause: failure.cause.to_string(),
                });
                Outcome::Failed(failure)
            }
        }
    }
}
