//! Physical ADC channel to logical cell routing.
//!
//! Wiring does not follow cell order. Battery 0 cells 0..5 sit on channels
//! 5, 4, 0, 1, 2, 3; battery 1 cells 0..5 on channels 6..11.

use crate::cell::CellId;
use crate::config::{BATTERY_COUNT, CELLS_PER_BATTERY, CELL_COUNT, CHANNEL_COUNT};

/// Per-cell samples for one tick, indexed `[battery][cell]`.
pub type CellSamples = [[u16; CELLS_PER_BATTERY]; BATTERY_COUNT];

/// Channel index -> cell.
pub const CHANNEL_MAP: [CellId; CHANNEL_COUNT] = [
    CellId::at(0, 2),
    CellId::at(0, 3),
    CellId::at(0, 4),
    CellId::at(0, 5),
    CellId::at(0, 1),
    CellId::at(0, 0),
    CellId::at(1, 0),
    CellId::at(1, 1),
    CellId::at(1, 2),
    CellId::at(1, 3),
    CellId::at(1, 4),
    CellId::at(1, 5),
];

/// Cell `[battery][cell]` -> channel index.
pub const CELL_CHANNELS: [[usize; CELLS_PER_BATTERY]; BATTERY_COUNT] =
    [[5, 4, 0, 1, 2, 3], [6, 7, 8, 9, 10, 11]];

/// Bitmask of every channel the router consumes, handed to the sample source.
pub const ACTIVE_CHANNEL_MASK: u16 = active_mask();

const fn active_mask() -> u16 {
    let mut mask = 0u16;
    let mut b = 0;
    while b < BATTERY_COUNT {
        let mut c = 0;
        while c < CELLS_PER_BATTERY {
            mask |= 1 << CELL_CHANNELS[b][c];
            c += 1;
        }
        b += 1;
    }
    mask
}

const fn tables_are_bijective() -> bool {
    let mut seen = [false; CELL_COUNT];
    let mut ch = 0;
    while ch < CHANNEL_COUNT {
        let cell = CHANNEL_MAP[ch];
        if seen[cell.index()] {
            return false;
        }
        seen[cell.index()] = true;
        if CELL_CHANNELS[cell.battery() as usize][cell.cell() as usize] != ch {
            return false;
        }
        ch += 1;
    }
    true
}

const _: () = assert!(tables_are_bijective());

pub fn cell_for_channel(channel: usize) -> Option<CellId> {
    CHANNEL_MAP.get(channel).copied()
}

pub fn channel_for_cell(cell: CellId) -> usize {
    CELL_CHANNELS[cell.battery() as usize][cell.cell() as usize]
}

/// Reorders one tick of raw channel readings into cell order.
pub fn route(raw: &[u16; CHANNEL_COUNT]) -> CellSamples {
    let mut out = [[0u16; CELLS_PER_BATTERY]; BATTERY_COUNT];
    for (channel, &sample) in raw.iter().enumerate() {
        let cell = CHANNEL_MAP[channel];
        out[cell.battery() as usize][cell.cell() as usize] = sample;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_channel_maps_to_a_distinct_cell() {
        let cells: HashSet<CellId> = (0..CHANNEL_COUNT)
            .map(|ch| cell_for_channel(ch).unwrap())
            .collect();
        assert_eq!(cells.len(), CELL_COUNT);
        assert!(cell_for_channel(CHANNEL_COUNT).is_none());
    }

    #[test]
    fn every_cell_has_exactly_one_channel() {
        let channels: HashSet<usize> = CellId::all().map(channel_for_cell).collect();
        assert_eq!(channels.len(), CHANNEL_COUNT);
        for cell in CellId::all() {
            assert_eq!(cell_for_channel(channel_for_cell(cell)), Some(cell));
        }
    }

    #[test]
    fn battery_zero_follows_board_wiring() {
        let wired = [5, 4, 0, 1, 2, 3];
        for (cell, &ch) in wired.iter().enumerate() {
            let id = CellId::new(0, cell as u8).unwrap();
            assert_eq!(channel_for_cell(id), ch);
        }
    }

    #[test]
    fn route_places_samples_by_cell() {
        let mut raw = [0u16; CHANNEL_COUNT];
        for (ch, slot) in raw.iter_mut().enumerate() {
            *slot = 100 + ch as u16;
        }
        let cells = route(&raw);
        assert_eq!(cells[0], [105, 104, 100, 101, 102, 103]);
        assert_eq!(cells[1], [106, 107, 108, 109, 110, 111]);
    }

    #[test]
    fn active_mask_covers_twelve_channels() {
        assert_eq!(ACTIVE_CHANNEL_MASK, 0x0FFF);
    }
}
