use crate::cell::CellId;
use crate::frame::{self, Frame};
use crate::hal::FrameSink;
use crate::state::CellAverages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    Idle,
    Sending(CellId),
}

/// Result of one scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmission<E> {
    pub cell: CellId,
    pub frame: Frame,
    pub fresh: bool,
    pub result: Result<(), E>,
}

/// Round-robin telemetry over all twelve cells, one frame per step.
pub struct Scheduler {
    state: SchedulerState,
    can_id: u16,
    sent: u32,
    dropped: u32,
}

impl Scheduler {
    pub const fn new(can_id: u16) -> Self {
        Self {
            state: SchedulerState::Idle,
            can_id,
            sent: 0,
            dropped: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Moves to the next cell: cell index first, battery on cell wraparound.
    pub fn advance(&mut self) -> CellId {
        let next = match self.state {
            SchedulerState::Idle => CellId::FIRST,
            SchedulerState::Sending(current) => current.next(),
        };
        self.state = SchedulerState::Sending(next);
        next
    }

    /// Advances, encodes the current average of the new cell and makes one
    /// transmission attempt.
    pub fn step<S: FrameSink>(
        &mut self,
        averages: &CellAverages,
        sink: &mut S,
    ) -> Transmission<S::Error> {
        let cell = self.advance();
        let reading = averages.reading(cell);
        let frame = frame::encode(cell, frame::wire_code(reading.average));
        let result = sink.try_send(self.can_id, &frame);
        match result {
            Ok(()) => self.sent = self.sent.wrapping_add(1),
            Err(_) => self.dropped = self.dropped.wrapping_add(1),
        }
        Transmission {
            cell,
            frame,
            fresh: reading.fresh,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CELL_COUNT, TELEMETRY_CAN_ID};
    use std::collections::HashSet;
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(u16, Frame)>,
        reject_every: Option<usize>,
        attempts: usize,
    }

    impl FrameSink for Recorder {
        type Error = &'static str;

        fn try_send(&mut self, id: u16, frame: &Frame) -> Result<(), Self::Error> {
            self.attempts += 1;
            if let Some(n) = self.reject_every {
                if self.attempts % n == 0 {
                    return Err("mailbox busy");
                }
            }
            self.frames.push((id, *frame));
            Ok(())
        }
    }

    #[test]
    fn twelve_advances_visit_every_cell_once_in_order() {
        let mut scheduler = Scheduler::new(TELEMETRY_CAN_ID);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let order: Vec<CellId> = (0..CELL_COUNT).map(|_| scheduler.advance()).collect();
        let expected: Vec<CellId> = CellId::all().collect();
        assert_eq!(order, expected);
        assert_eq!(order.iter().collect::<HashSet<_>>().len(), CELL_COUNT);

        // The order repeats exactly on the next round.
        let second: Vec<CellId> = (0..CELL_COUNT).map(|_| scheduler.advance()).collect();
        assert_eq!(second, expected);
    }

    #[test]
    fn step_sends_current_average_of_each_cell() {
        let averages = CellAverages::new();
        for cell in CellId::all() {
            averages.publish(cell, 1000 + cell.index() as u32);
        }
        let mut scheduler = Scheduler::new(TELEMETRY_CAN_ID);
        let mut sink = Recorder::default();

        for _ in 0..CELL_COUNT {
            let tx = scheduler.step(&averages, &mut sink);
            assert!(tx.result.is_ok());
            assert!(tx.fresh);
        }

        assert_eq!(sink.frames.len(), CELL_COUNT);
        for ((id, frame), cell) in sink.frames.iter().zip(CellId::all()) {
            assert_eq!(*id, TELEMETRY_CAN_ID);
            assert_eq!(
                Frame::decode(frame.as_bytes()),
                Ok((cell, 1000 + cell.index() as u16))
            );
        }
    }

    #[test]
    fn dropped_frames_are_counted_not_retried() {
        let averages = CellAverages::new();
        let mut scheduler = Scheduler::new(TELEMETRY_CAN_ID);
        let mut sink = Recorder {
            reject_every: Some(3),
            ..Recorder::default()
        };

        for _ in 0..CELL_COUNT {
            scheduler.step(&averages, &mut sink);
        }
        assert_eq!(sink.attempts, CELL_COUNT);
        assert_eq!(scheduler.dropped(), 4);
        assert_eq!(scheduler.sent(), 8);
        // The cell after a dropped one is still next in line.
        assert_eq!(scheduler.state(), SchedulerState::Sending(CellId::new(1, 5).unwrap()));
    }

    #[test]
    fn unpublished_cells_go_out_flagged_stale() {
        let averages = CellAverages::new();
        let mut scheduler = Scheduler::new(TELEMETRY_CAN_ID);
        let mut sink = Recorder::default();
        let tx = scheduler.step(&averages, &mut sink);
        assert_eq!(tx.cell, CellId::FIRST);
        assert!(!tx.fresh);
        assert_eq!(tx.frame.as_bytes(), &[0x00, 0x00, 0x00]);
    }
}
