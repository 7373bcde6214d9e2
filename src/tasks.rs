use bmb_core::config::{
    code_to_millivolts, REDUCE_POLICY, SAMPLE_PERIOD_MS, STALE_AFTER_TICKS, TELEMETRY_CAN_ID,
    TELEMETRY_PERIOD_MS,
};
use bmb_core::{AveragingBuffers, AveragingEngine, Scheduler};
use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

use crate::ads7828::CellAdc;
use crate::hardware::{AdcDevice, CanController};
use crate::state::CELL_AVERAGES;

/// Sampling tick. Runs on the interrupt executor and preempts the telemetry
/// loop; it owns the averaging windows and never waits on the CAN bus.
#[embassy_executor::task]
pub async fn sampling_task(
    mut adc: CellAdc<AdcDevice>,
    buffers: &'static mut AveragingBuffers,
    mut heartbeat: Output<'static>,
) {
    let mut engine = AveragingEngine::new(REDUCE_POLICY, STALE_AFTER_TICKS);
    // Publish the fill value so early telemetry never reports 0 V.
    engine.reduce(buffers, &CELL_AVERAGES);
    info!("Sampling every {} ms, reduce policy {}", SAMPLE_PERIOD_MS, engine.policy());

    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_PERIOD_MS));
    let mut primed = false;
    loop {
        ticker.next().await;
        heartbeat.toggle();

        match engine.tick(&mut adc, buffers, &CELL_AVERAGES) {
            Ok(outcome) => {
                if outcome.recovered {
                    info!("Cell ADCs responding again");
                }
                if !primed && buffers.is_primed() {
                    primed = true;
                    info!("Averaging window filled after {} ticks", buffers.ticks());
                }
            }
            Err(e) => {
                warn!("Cell ADC read failed: {}", Debug2Format(&e.source));
                if e.became_stale {
                    warn!("No samples for {} ticks, cell averages stale", STALE_AFTER_TICKS);
                }
            }
        }
    }
}

/// Foreground telemetry loop: one cell per period, round robin.
#[embassy_executor::task]
pub async fn telemetry_task(mut can: CanController) {
    let mut scheduler = Scheduler::new(TELEMETRY_CAN_ID);
    let mut ticker = Ticker::every(Duration::from_millis(TELEMETRY_PERIOD_MS));

    loop {
        ticker.next().await;

        let tx = scheduler.step(&CELL_AVERAGES, &mut can);
        let [_, hi, lo] = *tx.frame.as_bytes();
        let code = u16::from_be_bytes([hi, lo]);

        match tx.result {
            Ok(()) => debug!(
                "TX {}: code {} ({} mV){}",
                tx.cell,
                code,
                code_to_millivolts(code as u32),
                if tx.fresh { "" } else { " stale" }
            ),
            Err(e) => warn!(
                "Dropped frame for {} ({} dropped so far): {}",
                tx.cell,
                scheduler.dropped(),
                Debug2Format(&e)
            ),
        }
    }
}
