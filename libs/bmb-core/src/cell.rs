use core::fmt;

use crate::config::{BATTERY_COUNT, CELLS_PER_BATTERY, CELL_COUNT};

/// A monitored cell: `(battery, cell)` with `battery < 2` and `cell < 6`.
///
/// Values outside that domain cannot be constructed, so every indexing
/// operation keyed by a `CellId` is in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellId {
    battery: u8,
    cell: u8,
}

impl CellId {
    pub const FIRST: CellId = CellId::at(0, 0);

    pub const fn new(battery: u8, cell: u8) -> Option<Self> {
        if (battery as usize) < BATTERY_COUNT && (cell as usize) < CELLS_PER_BATTERY {
            Some(Self { battery, cell })
        } else {
            None
        }
    }

    /// Const constructor for lookup tables; out-of-range input fails the build.
    pub(crate) const fn at(battery: u8, cell: u8) -> Self {
        assert!((battery as usize) < BATTERY_COUNT);
        assert!((cell as usize) < CELLS_PER_BATTERY);
        Self { battery, cell }
    }

    /// Inverse of [`CellId::index`].
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Self {
                battery: (index / CELLS_PER_BATTERY) as u8,
                cell: (index % CELLS_PER_BATTERY) as u8,
            })
        } else {
            None
        }
    }

    pub const fn battery(self) -> u8 {
        self.battery
    }

    pub const fn cell(self) -> u8 {
        self.cell
    }

    /// Flat index in `0..12`, battery-major.
    pub const fn index(self) -> usize {
        self.battery as usize * CELLS_PER_BATTERY + self.cell as usize
    }

    /// Battery in the high nibble, cell in the low nibble.
    pub const fn nibbles(self) -> u8 {
        (self.battery << 4) | self.cell
    }

    pub const fn from_nibbles(byte: u8) -> Option<Self> {
        Self::new(byte >> 4, byte & 0x0F)
    }

    /// Next cell in round-robin order: cell first, battery on cell wraparound.
    pub const fn next(self) -> Self {
        if (self.cell as usize) + 1 < CELLS_PER_BATTERY {
            Self {
                battery: self.battery,
                cell: self.cell + 1,
            }
        } else {
            Self {
                battery: ((self.battery as usize + 1) % BATTERY_COUNT) as u8,
                cell: 0,
            }
        }
    }

    /// All twelve cells in round-robin order.
    pub fn all() -> impl Iterator<Item = CellId> {
        (0..CELL_COUNT).filter_map(CellId::from_index)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}C{}", self.battery, self.cell)
    }
}
