use bmb_core::{AveragingBuffers, CellAverages};
use static_cell::StaticCell;

/// Written by the sampling tick only, read by the telemetry loop only.
pub static CELL_AVERAGES: CellAverages = CellAverages::new();

/// Averaging windows, handed to the sampling tick as its exclusive `&'static mut`.
pub static AVERAGING_BUFFERS: StaticCell<AveragingBuffers> = StaticCell::new();
