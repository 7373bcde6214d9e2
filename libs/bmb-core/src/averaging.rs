use crate::cell::CellId;
use crate::config::CHANNEL_COUNT;
use crate::hal::SampleSource;
use crate::ring::AveragingBuffers;
use crate::router::{self, ACTIVE_CHANNEL_MASK};
use crate::state::CellAverages;

/// When the engine re-sums the windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReducePolicy {
    /// Reduce after every sampling tick.
    EveryTick,
    /// Reduce only when the cursor wraps, i.e. once per full window.
    FullCycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutcome {
    /// New averages were published this tick.
    pub reduced: bool,
    /// This tick ended a run of failed ticks that had marked the cells stale.
    pub recovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickError<E> {
    pub source: E,
    /// This failure crossed the staleness threshold.
    pub became_stale: bool,
}

/// Folds sampling ticks into the averaging windows and publishes averages.
pub struct AveragingEngine {
    policy: ReducePolicy,
    stale_after: u32,
    failed_ticks: u32,
}

impl AveragingEngine {
    pub const fn new(policy: ReducePolicy, stale_after: u32) -> Self {
        Self {
            policy,
            stale_after,
            failed_ticks: 0,
        }
    }

    pub fn policy(&self) -> ReducePolicy {
        self.policy
    }

    pub fn is_stale(&self) -> bool {
        self.failed_ticks >= self.stale_after
    }

    /// Sums every window and publishes the shift-divided mean of each cell.
    pub fn reduce(&self, buffers: &AveragingBuffers, averages: &CellAverages) {
        for cell in CellId::all() {
            averages.publish(cell, buffers.average(cell));
        }
    }

    /// One sampling tick worth of work on readings that were already taken.
    pub fn on_samples(
        &mut self,
        raw: &[u16; CHANNEL_COUNT],
        buffers: &mut AveragingBuffers,
        averages: &CellAverages,
    ) -> TickOutcome {
        let recovered = self.is_stale();
        self.failed_ticks = 0;

        buffers.write_all(&router::route(raw));
        buffers.advance();

        let reduced = match self.policy {
            ReducePolicy::EveryTick => true,
            ReducePolicy::FullCycle => buffers.cursor() == 0,
        };
        if reduced {
            self.reduce(buffers, averages);
        }
        TickOutcome { reduced, recovered }
    }

    /// Records a tick where the sample source produced nothing. Buffers and
    /// averages are left alone; after enough misses the cells go stale.
    pub fn on_missed_tick(&mut self, averages: &CellAverages) -> bool {
        self.failed_ticks = self.failed_ticks.saturating_add(1);
        let became_stale = self.failed_ticks == self.stale_after;
        if became_stale {
            averages.mark_stale();
        }
        became_stale
    }

    /// Full sampling tick: acquire, route, store, maybe reduce.
    pub fn tick<S: SampleSource>(
        &mut self,
        source: &mut S,
        buffers: &mut AveragingBuffers,
        averages: &CellAverages,
    ) -> Result<TickOutcome, TickError<S::Error>> {
        let mut raw = [0u16; CHANNEL_COUNT];
        match source.sample(ACTIVE_CHANNEL_MASK, &mut raw) {
            Ok(()) => Ok(self.on_samples(&raw, buffers, averages)),
            Err(source) => Err(TickError {
                source,
                became_stale: self.on_missed_tick(averages),
            }),
        }
    }
}
