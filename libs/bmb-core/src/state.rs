use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::cell::CellId;
use crate::config::{BATTERY_COUNT, CELLS_PER_BATTERY};

/// Latest published moving average per cell.
///
/// Single writer (the sampling tick), single reader (the telemetry loop).
/// Each average is one 32-bit word published with a single store, so a
/// reader preempted mid-read still sees either the old or the new value.
pub struct CellAverages {
    averages: [[AtomicU32; CELLS_PER_BATTERY]; BATTERY_COUNT],
    fresh: [[AtomicBool; CELLS_PER_BATTERY]; BATTERY_COUNT],
}

/// What the reader sees for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellReading {
    pub average: u32,
    /// False until the first reduce, and again after the sample source has
    /// been failing for a while.
    pub fresh: bool,
}

impl CellAverages {
    pub const fn new() -> Self {
        Self {
            averages: [const { [const { AtomicU32::new(0) }; CELLS_PER_BATTERY] }; BATTERY_COUNT],
            fresh: [const { [const { AtomicBool::new(false) }; CELLS_PER_BATTERY] }; BATTERY_COUNT],
        }
    }

    pub fn publish(&self, cell: CellId, average: u32) {
        let (b, c) = (cell.battery() as usize, cell.cell() as usize);
        self.averages[b][c].store(average, Ordering::Release);
        self.fresh[b][c].store(true, Ordering::Release);
    }

    pub fn load(&self, cell: CellId) -> u32 {
        self.averages[cell.battery() as usize][cell.cell() as usize].load(Ordering::Acquire)
    }

    pub fn is_fresh(&self, cell: CellId) -> bool {
        self.fresh[cell.battery() as usize][cell.cell() as usize].load(Ordering::Acquire)
    }

    pub fn reading(&self, cell: CellId) -> CellReading {
        CellReading {
            average: self.load(cell),
            fresh: self.is_fresh(cell),
        }
    }

    /// Flags every cell stale; the averages themselves are kept.
    pub fn mark_stale(&self) {
        for flag in self.fresh.iter().flatten() {
            flag.store(false, Ordering::Release);
        }
    }
}

impl Default for CellAverages {
    fn default() -> Self {
        Self::new()
    }
}
