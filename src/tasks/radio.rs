//! Radio task driving the protocol engine
//!
//! Brings up the CMT2300A, then polls the engine at a fixed cadence. Commands
//! arrive through the shared queue from any other task.

use embassy_time::Timer;
use log::{info, warn};

use crate::commands::BoxedCommand;
use crate::config::RadioConfig;
use crate::radio::{CmtChip, CmtRadio, RadioEngine};
use crate::util::{CommandQueue, EmbassyClock};

/// Task that owns the radio and runs every queued command to completion
pub async fn radio_task<C: CmtChip>(
    mut radio: CmtRadio<'static, C>,
    queue: &'static CommandQueue<BoxedCommand>,
    config: RadioConfig,
) {
    info!("Radio: initialising CMT2300A...");
    match radio.init() {
        Ok(()) => info!("Radio: ready on {} Hz", radio.target_frequency()),
        Err(e) => warn!("Radio: init failed ({:?})", e),
    }

    let mut engine = RadioEngine::new(radio, queue, EmbassyClock, &config);
    let mut succeeded: u32 = 0;
    let mut failed: u32 = 0;

    loop {
        if let Some(outcome) = engine.poll() {
            if outcome.is_success() {
                succeeded = succeeded.wrapping_add(1);
            } else {
                failed = failed.wrapping_add(1);
            }
            info!(
                "Radio: {} done, {} ok / {} failed so far",
                outcome.name, succeeded, failed
            );
        }

        // Keep stepping without delay while an exchange is in flight
        if engine.is_idle() && engine.is_queue_empty() {
            Timer::after_millis(config.poll_interval_ms).await;
        } else {
            embassy_futures::yield_now().await;
        }
    }
}
