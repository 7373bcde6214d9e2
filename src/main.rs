#![no_std]
#![no_main]

use bmb_core::config::SENTINEL_SAMPLE;
use bmb_core::AveragingBuffers;
use cortex_m_rt::entry;
use defmt::*;
use embassy_executor::{Executor, InterruptExecutor};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

mod ads7828;
mod hardware;
mod mcp2515;
mod state;
mod tasks;

use state::AVERAGING_BUFFERS;
use tasks::{sampling_task, telemetry_task};

/// Stands in for the sampling timer interrupt: everything spawned here
/// preempts the thread-mode executor.
static EXECUTOR_SAMPLING: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_MAIN: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_SAMPLING.on_interrupt()
}

#[entry]
fn main() -> ! {
    let p = embassy_rp::init(Default::default());
    info!("Battery monitor board starting");

    let hw = hardware::init(p);

    // Fill before the tick can run.
    let buffers = AVERAGING_BUFFERS.init_with(|| AveragingBuffers::new_filled(SENTINEL_SAMPLE));

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner = EXECUTOR_SAMPLING.start(interrupt::SWI_IRQ_1);
    unwrap!(spawner.spawn(sampling_task(hw.adc, buffers, hw.heartbeat)));

    let executor = EXECUTOR_MAIN.init(Executor::new());
    executor.run(|spawner| {
        unwrap!(spawner.spawn(telemetry_task(hw.can)));
    })
}
