//! Compile-time configuration. There is no runtime configuration surface.

use crate::averaging::ReducePolicy;

pub const BATTERY_COUNT: usize = 2;
pub const CELLS_PER_BATTERY: usize = 6;
pub const CELL_COUNT: usize = BATTERY_COUNT * CELLS_PER_BATTERY;

/// One physical analog channel per monitored cell.
pub const CHANNEL_COUNT: usize = CELL_COUNT;

pub const ADC_BITS: u32 = 12;
pub const ADC_MAX: u16 = (1 << ADC_BITS) - 1;
/// External reference feeding the cell ADCs.
pub const ADC_REF_MV: u32 = 3_000;

/// Single source for the averaging window; size and mask are derived from it.
pub const RING_CAPACITY_LOG2: u32 = 7;
pub const RING_CAPACITY: usize = 1 << RING_CAPACITY_LOG2;
pub const RING_MASK: usize = RING_CAPACITY - 1;

const _: () = assert!(RING_CAPACITY.is_power_of_two());
const _: () = assert!((ADC_MAX as u64) * (RING_CAPACITY as u64) <= u32::MAX as u64);

/// Fill value written to every ring before sampling starts, so a cell that
/// has not been sampled yet does not read as dead-shorted.
pub const SENTINEL_SAMPLE: u16 = 0x00FF;

pub const REDUCE_POLICY: ReducePolicy = ReducePolicy::EveryTick;

/// Consecutive failed sampling ticks before every cell is flagged stale.
pub const STALE_AFTER_TICKS: u32 = 10;

/// Standard CAN id of the telemetry frame (task group 4, ECU 4).
pub const TELEMETRY_CAN_ID: u16 = 0x44;

pub const SAMPLE_PERIOD_MS: u64 = 100;
/// Delay between two telemetry frames; a full round robin takes 12 of these.
pub const TELEMETRY_PERIOD_MS: u64 = 3_000;

/// Converts an averaged converter code to millivolts at the ADC pin.
pub const fn code_to_millivolts(code: u32) -> u32 {
    code * ADC_REF_MV / ADC_MAX as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_mask_matches_capacity() {
        assert_eq!(RING_CAPACITY, 128);
        assert_eq!(RING_MASK, 0x7F);
        assert_eq!(RING_CAPACITY & RING_MASK, 0);
    }

    #[test]
    fn millivolt_conversion_spans_reference() {
        assert_eq!(code_to_millivolts(0), 0);
        assert_eq!(code_to_millivolts(ADC_MAX as u32), ADC_REF_MV);
        assert_eq!(code_to_millivolts(2048), 1500);
    }
}
