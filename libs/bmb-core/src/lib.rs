#![no_std]

//! Acquisition, averaging and telemetry encoding for the battery monitor board.
//!
//! Everything in here is hardware independent. The firmware crate supplies a
//! [`hal::SampleSource`] (the cell ADCs) and a [`hal::FrameSink`] (the CAN
//! controller) and drives the two halves from its sampling tick and its
//! telemetry loop.

#[cfg(test)]
extern crate std;

pub mod averaging;
pub mod cell;
pub mod config;
pub mod frame;
pub mod hal;
pub mod ring;
pub mod router;
pub mod scheduler;
pub mod state;

pub use averaging::{AveragingEngine, ReducePolicy, TickError, TickOutcome};
pub use cell::CellId;
pub use frame::{encode, Frame, FrameError, FRAME_LEN};
pub use hal::{FrameSink, SampleSource};
pub use ring::AveragingBuffers;
pub use scheduler::{Scheduler, SchedulerState, Transmission};
pub use state::{CellAverages, CellReading};
