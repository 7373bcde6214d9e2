use crate::cell::CellId;
use crate::config::{
    BATTERY_COUNT, CELLS_PER_BATTERY, RING_CAPACITY, RING_CAPACITY_LOG2, RING_MASK,
};
use crate::router::CellSamples;

type Ring = [u16; RING_CAPACITY];

/// Moving-average windows for all twelve cells.
///
/// Every ring is written at the same cursor position; the cursor moves once
/// per sampling tick. Only the sampling tick owns this, readers go through
/// [`crate::state::CellAverages`].
pub struct AveragingBuffers {
    rings: [[Ring; CELLS_PER_BATTERY]; BATTERY_COUNT],
    cursor: usize,
    ticks: u32,
}

impl AveragingBuffers {
    pub const fn new_filled(fill: u16) -> Self {
        Self {
            rings: [[[fill; RING_CAPACITY]; CELLS_PER_BATTERY]; BATTERY_COUNT],
            cursor: 0,
            ticks: 0,
        }
    }

    /// Overwrites every slot of every ring and rewinds the cursor.
    pub fn fill(&mut self, value: u16) {
        for ring in self.rings.iter_mut().flatten() {
            ring.fill(value);
        }
        self.cursor = 0;
        self.ticks = 0;
    }

    /// Stores `sample` at the shared cursor, replacing the oldest entry.
    pub fn write(&mut self, cell: CellId, sample: u16) {
        self.rings[cell.battery() as usize][cell.cell() as usize][self.cursor] = sample;
    }

    pub fn write_all(&mut self, samples: &CellSamples) {
        let cursor = self.cursor;
        for (rings, row) in self.rings.iter_mut().zip(samples) {
            for (ring, &sample) in rings.iter_mut().zip(row) {
                ring[cursor] = sample;
            }
        }
    }

    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) & RING_MASK;
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Ticks since the last fill, saturating.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// True once every slot holds a real sample rather than the fill value.
    pub fn is_primed(&self) -> bool {
        self.ticks as usize >= RING_CAPACITY
    }

    pub fn window(&self, cell: CellId) -> &Ring {
        &self.rings[cell.battery() as usize][cell.cell() as usize]
    }

    pub fn sum(&self, cell: CellId) -> u32 {
        self.window(cell).iter().map(|&s| u32::from(s)).sum()
    }

    /// Floor mean of the window; capacity is a power of two so this is a shift.
    pub fn average(&self, cell: CellId) -> u32 {
        self.sum(cell) >> RING_CAPACITY_LOG2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ADC_MAX, SENTINEL_SAMPLE};

    fn cell(b: u8, c: u8) -> CellId {
        CellId::new(b, c).unwrap()
    }

    #[test]
    fn cursor_wraps_at_capacity() {
        let mut buffers = AveragingBuffers::new_filled(0);
        for _ in 0..RING_CAPACITY - 1 {
            buffers.advance();
        }
        assert_eq!(buffers.cursor(), RING_CAPACITY - 1);
        buffers.advance();
        assert_eq!(buffers.cursor(), 0);
        assert!(buffers.is_primed());
    }

    #[test]
    fn write_overwrites_oldest_entry_only() {
        let mut buffers = AveragingBuffers::new_filled(SENTINEL_SAMPLE);
        let target = cell(1, 2);
        for i in 0..RING_CAPACITY {
            buffers.write(target, i as u16);
            buffers.advance();
        }
        // Next write lands on slot 0, the oldest.
        buffers.write(target, 4000);
        let window = buffers.window(target);
        assert_eq!(window[0], 4000);
        assert_eq!(window[1], 1);
        assert_eq!(window[RING_CAPACITY - 1], (RING_CAPACITY - 1) as u16);
        // Other cells untouched.
        assert!(buffers.window(cell(0, 0)).iter().all(|&s| s == SENTINEL_SAMPLE));
    }

    #[test]
    fn all_cells_share_the_cursor() {
        let mut buffers = AveragingBuffers::new_filled(0);
        buffers.advance();
        buffers.advance();
        buffers.write_all(&[[7; CELLS_PER_BATTERY]; BATTERY_COUNT]);
        for id in CellId::all() {
            let window = buffers.window(id);
            assert_eq!(window[2], 7);
            assert_eq!(window.iter().filter(|&&s| s != 0).count(), 1);
        }
    }

    #[test]
    fn full_scale_sum_does_not_overflow() {
        let buffers = AveragingBuffers::new_filled(ADC_MAX);
        let id = cell(0, 5);
        assert_eq!(buffers.sum(id), ADC_MAX as u32 * RING_CAPACITY as u32);
        assert_eq!(buffers.average(id), ADC_MAX as u32);
    }

    #[test]
    fn fill_rewinds() {
        let mut buffers = AveragingBuffers::new_filled(0);
        buffers.write(cell(0, 0), 12);
        buffers.advance();
        buffers.fill(SENTINEL_SAMPLE);
        assert_eq!(buffers.cursor(), 0);
        assert_eq!(buffers.ticks(), 0);
        assert_eq!(buffers.average(cell(0, 0)), SENTINEL_SAMPLE as u32);
    }
}
