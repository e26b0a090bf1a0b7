use std::sync::Mutex;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use well_harvest_core::{CellSnapshot, RowSnapshot, RowUnreadable};
use well_harvest_engine::{
    HarvestError, HarvestSettings, Harvester, ListSurface, PipelineEvent, ProgressSink,
    SurfaceError, Termination,
};

#[derive(Debug, Clone)]
enum FakeRow {
    Live(usize),
    Stale,
}

/// A list of `total` documents shown through a window of `window` rows that
/// moves `step` rows per advance.
struct ScrollingList {
    total: usize,
    window: usize,
    step: usize,
    offset: usize,
    anchor_after_polls: usize,
    polls: usize,
    stale_every: Option<usize>,
    fail_advance_after: Option<usize>,
    advances: usize,
    visible_calls: usize,
}

impl ScrollingList {
    fn new(total: usize, window: usize, step: usize) -> Self {
        Self {
            total,
            window,
            step,
            offset: 0,
            anchor_after_polls: 0,
            polls: 0,
            stale_every: None,
            fail_advance_after: None,
            advances: 0,
            visible_calls: 0,
        }
    }
}

fn snapshot(index: usize) -> RowSnapshot {
    RowSnapshot::new(vec![
        CellSnapshot::text(""),
        CellSnapshot::entry(
            format!("Doc {index}"),
            format!("/DocView.aspx?id={index}"),
        ),
        CellSnapshot::text("Final"),
        CellSnapshot::text(format!("W{index}")),
    ])
}

#[async_trait::async_trait]
impl ListSurface for ScrollingList {
    type Anchor = ();
    type Row = FakeRow;

    async fn find_anchor(&mut self, _selector: &str) -> Result<Option<()>, SurfaceError> {
        self.polls += 1;
        Ok((self.polls > self.anchor_after_polls).then_some(()))
    }

    async fn visible_rows(&mut self) -> Result<Vec<FakeRow>, SurfaceError> {
        self.visible_calls += 1;
        let end = (self.offset + self.window).min(self.total);
        Ok((self.offset..end)
            .map(|i| match self.stale_every {
                Some(n) if i % n == 0 && self.visible_calls == 1 => FakeRow::Stale,
                _ => FakeRow::Live(i),
            })
            .collect())
    }

    async fn read_row(&mut self, row: &FakeRow) -> Result<RowSnapshot, RowUnreadable> {
        match row {
            FakeRow::Live(i) => Ok(snapshot(*i)),
            FakeRow::Stale => Err(RowUnreadable::Stale),
        }
    }

    async fn advance(&mut self, _anchor: &()) -> Result<(), SurfaceError> {
        self.advances += 1;
        if let Some(limit) = self.fail_advance_after {
            if self.advances > limit {
                return Err(SurfaceError::Disconnected("page crashed".into()));
            }
        }
        let last_start = self.total.saturating_sub(self.window);
        self.offset = (self.offset + self.step).min(last_start);
        Ok(())
    }
}

/// Surface that renders one never-seen row per observation.
struct EndlessFeed {
    next: usize,
}

#[async_trait::async_trait]
impl ListSurface for EndlessFeed {
    type Anchor = ();
    type Row = usize;

    async fn find_anchor(&mut self, _selector: &str) -> Result<Option<()>, SurfaceError> {
        Ok(Some(()))
    }

    async fn visible_rows(&mut self) -> Result<Vec<usize>, SurfaceError> {
        self.next += 1;
        Ok(vec![self.next])
    }

    async fn read_row(&mut self, row: &usize) -> Result<RowSnapshot, RowUnreadable> {
        Ok(snapshot(*row))
    }

    async fn advance(&mut self, _anchor: &()) -> Result<(), SurfaceError> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    fn accumulated(&self) -> Vec<usize> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                PipelineEvent::CycleCompleted { accumulated, .. } => Some(*accumulated),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Cancels the run once a given cycle completes.
struct CancelAfter {
    cycle: u32,
    token: CancellationToken,
}

impl ProgressSink for CancelAfter {
    fn emit(&self, event: PipelineEvent) {
        if let PipelineEvent::CycleCompleted { cycle, .. } = event {
            if cycle >= self.cycle {
                self.token.cancel();
            }
        }
    }
}

fn settings(stall_threshold: u32, max_cycles: u32) -> HarvestSettings {
    HarvestSettings {
        stall_threshold,
        max_cycles,
        ..HarvestSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn converges_with_every_document_exactly_once() {
    harvest_logging::initialize_for_tests();
    // 25 documents, 10 visible, 5 per scroll: 4 windows cover the list.
    let mut surface = ScrollingList::new(25, 10, 5);
    let report = Harvester::new(settings(3, 1000))
        .run(&mut surface)
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Converged);
    assert_eq!(report.records.len(), 25);
    assert!(report.cycles <= 4 + 3, "took {} cycles", report.cycles);

    let names: Vec<&str> = report.records.iter().map(|r| r.name()).collect();
    let expected: Vec<String> = (0..25).map(|i| format!("Doc {i}")).collect();
    assert_eq!(names, expected);
}

#[tokio::test(start_paused = true)]
async fn stops_at_the_safety_bound() {
    let mut surface = EndlessFeed { next: 0 };
    let report = Harvester::new(settings(10, 5))
        .run(&mut surface)
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::SafetyBoundReached);
    assert_eq!(report.cycles, 5);
    assert_eq!(report.records.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn missing_anchor_fails_before_any_observation() {
    let mut surface = ScrollingList::new(5, 5, 5);
    surface.anchor_after_polls = usize::MAX;

    let harvest_settings = HarvestSettings {
        anchor_timeout: Duration::from_secs(2),
        ..HarvestSettings::default()
    };
    let err = Harvester::new(harvest_settings)
        .run(&mut surface)
        .await
        .unwrap_err();

    match err {
        HarvestError::SurfaceNotReady { selector } => assert_eq!(selector, "div.left-component"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(surface.visible_calls, 0);
    assert!(surface.polls > 1);
}

#[tokio::test(start_paused = true)]
async fn waits_for_a_late_anchor() {
    let mut surface = ScrollingList::new(3, 3, 3);
    surface.anchor_after_polls = 4;

    let report = Harvester::new(settings(2, 100))
        .run(&mut surface)
        .await
        .unwrap();
    assert_eq!(report.records.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn stale_rows_are_skipped_and_picked_up_later() {
    let mut surface = ScrollingList::new(12, 6, 3);
    surface.stale_every = Some(2);

    let report = Harvester::new(settings(2, 100))
        .run(&mut surface)
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Converged);
    // Rows 0, 2 and 4 are stale on the first pass only; the overlapping
    // window sees 4 again, rows 0 and 2 scroll out of view for good.
    assert_eq!(report.records.len(), 10);
    assert!(report.records.iter().all(|r| r.name() != "Doc 0"));
}

#[tokio::test(start_paused = true)]
async fn accumulated_count_never_decreases() {
    let sink = RecordingSink::default();
    let mut surface = ScrollingList::new(40, 8, 3);

    let report = Harvester::new(settings(4, 1000))
        .with_sink(&sink)
        .run(&mut surface)
        .await
        .unwrap();

    let counts = sink.accumulated();
    assert_eq!(counts.len() as u32, report.cycles);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{counts:?}");
    assert_eq!(counts.last().copied(), Some(40));
}

#[tokio::test(start_paused = true)]
async fn cancellation_returns_partial_records() {
    let token = CancellationToken::new();
    let sink = CancelAfter {
        cycle: 2,
        token: token.clone(),
    };
    let mut surface = ScrollingList::new(50, 5, 5);

    let report = Harvester::new(settings(3, 1000))
        .with_sink(&sink)
        .with_cancellation(token)
        .run(&mut surface)
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Cancelled);
    assert_eq!(report.cycles, 2);
    assert_eq!(report.records.len(), 10);
}

#[tokio::test(start_paused = true)]
async fn lost_surface_keeps_partial_records() {
    let mut surface = ScrollingList::new(30, 5, 5);
    surface.fail_advance_after = Some(2);

    let err = Harvester::new(settings(3, 1000))
        .run(&mut surface)
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::SurfaceLost { .. }));
    let partial = err.into_partial();
    assert_eq!(partial.len(), 15);
}
