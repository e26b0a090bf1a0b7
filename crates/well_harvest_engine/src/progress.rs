use harvest_logging::{harvest_debug, harvest_warn, PROGRESS_TARGET};

use crate::PipelineEvent;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}

/// Forwards events to the log under the progress target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::CycleCompleted {
                cycle,
                accumulated,
                stall_cycles,
            } => harvest_debug!(
                target: PROGRESS_TARGET,
                "cycle={} accumulated={} stall={}",
                cycle,
                accumulated,
                stall_cycles
            ),
            PipelineEvent::DetailFetched {
                index,
                reference,
                fields,
            } => harvest_debug!(
                target: PROGRESS_TARGET,
                "detail #{} fields={} reference={}",
                index,
                fields,
                reference
            ),
            PipelineEvent::DetailFailed {
                index,
                reference,
                cause,
            } => harvest_warn!(
                target: PROGRESS_TARGET,
                "detail #{} failed reference={} cause={}",
                index,
                reference,
                cause
            ),
        }
    }
}
