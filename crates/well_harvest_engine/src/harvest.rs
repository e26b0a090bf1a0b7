use std::time::Duration;

use harvest_logging::{harvest_debug, harvest_info, harvest_trace, harvest_warn};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use well_harvest_core::{
    decode_row, Accumulator, CandidateRecord, CycleVerdict, HarvestLimits, HarvestState, RowLayout,
};

use crate::progress::{NullSink, ProgressSink};
use crate::surface::{ListSurface, SurfaceError};
use crate::PipelineEvent;

const PROGRESS_LOG_EVERY: u32 = 10;

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub max_cycles: u32,
    pub stall_threshold: u32,
    /// Pause after each advance so the surface can re-render.
    pub settle_delay: Duration,
    pub anchor_selector: String,
    pub anchor_timeout: Duration,
    pub anchor_poll_interval: Duration,
    pub layout: RowLayout,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        let limits = HarvestLimits::default();
        Self {
            max_cycles: limits.max_cycles,
            stall_threshold: limits.stall_threshold,
            settle_delay: Duration::from_millis(500),
            anchor_selector: "div.left-component".to_string(),
            anchor_timeout: Duration::from_secs(20),
            anchor_poll_interval: Duration::from_millis(250),
            layout: RowLayout::default(),
        }
    }
}

impl HarvestSettings {
    fn limits(&self) -> HarvestLimits {
        HarvestLimits {
            max_cycles: self.max_cycles,
            stall_threshold: self.stall_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    SafetyBoundReached,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub records: Vec<CandidateRecord>,
    pub cycles: u32,
    pub termination: Termination,
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("anchor {selector:?} never appeared")]
    SurfaceNotReady { selector: String },
    #[error("surface lost with {} records accumulated: {source}", partial.len())]
    SurfaceLost {
        partial: Vec<CandidateRecord>,
        source: SurfaceError,
    },
}

impl HarvestError {
    /// Records accumulated before the run failed.
    pub fn into_partial(self) -> Vec<CandidateRecord> {
        match self {
            HarvestError::SurfaceNotReady { .. } => Vec::new(),
            HarvestError::SurfaceLost { partial, .. } => partial,
        }
    }
}

/// Drives observe/merge/advance cycles over a list surface until the list
/// stops growing.
pub struct Harvester<'a> {
    settings: HarvestSettings,
    sink: &'a dyn ProgressSink,
    cancel: CancellationToken,
}

impl<'a> Harvester<'a> {
    pub fn new(settings: HarvestSettings) -> Self {
        Self {
            settings,
            sink: &NullSink,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.sink = sink;
        self
    }

    /// Checked between cycles; a cancelled run returns what it has.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run<S>(&self, surface: &mut S) -> Result<HarvestReport, HarvestError>
    where
        S: ListSurface + ?Sized,
    {
        let anchor = self.wait_for_anchor(surface).await?;
        let limits = self.settings.limits();
        let mut accumulator = Accumulator::new();
        let mut state = HarvestState::new();

        let termination = loop {
            if self.cancel.is_cancelled() {
                harvest_warn!(
                    "Harvest cancelled after {} cycles with {} records",
                    state.cycles(),
                    accumulator.len()
                );
                break Termination::Cancelled;
            }

            let rows = match surface.visible_rows().await {
                Ok(rows) => rows,
                Err(source) => {
                    return Err(HarvestError::SurfaceLost {
                        partial: accumulator.into_records(),
                        source,
                    })
                }
            };

            let mut added = 0usize;
            let mut unreadable = 0usize;
            for row in &rows {
                let decoded = match surface.read_row(row).await {
                    Ok(snapshot) => decode_row(&snapshot, self.settings.layout),
                    Err(err) => Err(err),
                };
                match decoded {
                    Ok(record) => added += usize::from(accumulator.insert(record)),
                    Err(err) => {
                        unreadable += 1;
                        harvest_trace!("Skipping unreadable row: {}", err);
                    }
                }
            }

            let verdict = state.end_cycle(accumulator.len(), limits);
            harvest_debug!(
                "Cycle {}: {} rows visible, {} new, {} unreadable, {} total",
                state.cycles(),
                rows.len(),
                added,
                unreadable,
                accumulator.len()
            );
            self.sink.emit(PipelineEvent::CycleCompleted {
                cycle: state.cycles(),
                accumulated: accumulator.len(),
                stall_cycles: state.stall_cycles(),
            });
            if state.cycles() % PROGRESS_LOG_EVERY == 1 {
                harvest_info!(
                    "Cycle {}: extracted {} documents",
                    state.cycles(),
                    accumulator.len()
                );
            }

            match verdict {
                CycleVerdict::Continue => {}
                CycleVerdict::Converged => {
                    harvest_info!(
                        "No new documents after {} cycles; harvest converged with {} records",
                        state.stall_cycles(),
                        accumulator.len()
                    );
                    break Termination::Converged;
                }
                CycleVerdict::SafetyBoundReached => {
                    harvest_warn!(
                        "Stopping at the {} cycle bound with {} records; the list may be incomplete",
                        state.cycles(),
                        accumulator.len()
                    );
                    break Termination::SafetyBoundReached;
                }
            }

            if let Err(source) = surface.advance(&anchor).await {
                return Err(HarvestError::SurfaceLost {
                    partial: accumulator.into_records(),
                    source,
                });
            }
            sleep(self.settings.settle_delay).await;
        };

        Ok(HarvestReport {
            cycles: state.cycles(),
            records: accumulator.into_records(),
            termination,
        })
    }

    async fn wait_for_anchor<S>(&self, surface: &mut S) -> Result<S::Anchor, HarvestError>
    where
        S: ListSurface + ?Sized,
    {
        let selector = &self.settings.anchor_selector;
        let deadline = Instant::now() + self.settings.anchor_timeout;
        loop {
            match surface.find_anchor(selector).await {
                Ok(Some(anchor)) => return Ok(anchor),
                Ok(None) if Instant::now() >= deadline => {
                    harvest_warn!("Timed out waiting for anchor {:?}", selector);
                    return Err(HarvestError::SurfaceNotReady {
                        selector: selector.clone(),
                    });
                }
                Ok(None) => sleep(self.settings.anchor_poll_interval).await,
                Err(source) => {
                    return Err(HarvestError::SurfaceLost {
                        partial: Vec::new(),
                        source,
                    })
                }
            }
        }
    }
}
