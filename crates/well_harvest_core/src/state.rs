/// Bounds that end a harvest run. Zero values behave as 1: every run
/// observes the surface at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestLimits {
    pub max_cycles: u32,
    pub stall_threshold: u32,
}

impl Default for HarvestLimits {
    fn default() -> Self {
        Self {
            max_cycles: 1000,
            stall_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleVerdict {
    /// Advance the surface and observe again.
    Continue,
    /// `stall_threshold` consecutive cycles without growth.
    Converged,
    /// `max_cycles` cycles ran without convergence.
    SafetyBoundReached,
}

/// Termination bookkeeping for one harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestState {
    seen: usize,
    stall_cycles: u32,
    cycles: u32,
}

impl HarvestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the accumulator size at the end of a cycle and decides
    /// whether the run goes on.
    pub fn end_cycle(&mut self, accumulated: usize, limits: HarvestLimits) -> CycleVerdict {
        self.cycles += 1;
        if accumulated == self.seen {
            self.stall_cycles += 1;
        } else {
            self.stall_cycles = 0;
        }
        // The accumulator never shrinks; keep the high-water mark regardless.
        self.seen = self.seen.max(accumulated);

        if self.stall_cycles >= limits.stall_threshold.max(1) {
            CycleVerdict::Converged
        } else if self.cycles >= limits.max_cycles.max(1) {
            CycleVerdict::SafetyBoundReached
        } else {
            CycleVerdict::Continue
        }
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn stall_cycles(&self) -> u32 {
        self.stall_cycles
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}
