// Blink Task - schaltet alle LEDs gemeinsam an und aus
use defmt::{error, info, warn};
use embassy_time::Delay;
use esp_core::{Blinker, ChannelDriver, LoopObserver};

use crate::config::{BLINK_PERIOD_MS, COMMAND_ERROR_POLICY};
use crate::hal::GpioChannelDriver;

/// Loggt jedes Umschalten
///
/// Mit einer LED wird "LED is ON/OFF" geloggt, sonst "ALL LEDs ON/OFF".
struct BlinkLog {
    channel_count: usize,
}

impl LoopObserver for BlinkLog {
    fn on_blink(&mut self, on: bool, failed: u32) {
        if failed != 0 {
            warn!("LED commands failed (mask {=u32:#b}), continuing", failed);
        }

        let state = if on { "ON" } else { "OFF" };
        if self.channel_count == 1 {
            info!("LED is {}", state);
        } else {
            info!("ALL LEDs {}", state);
        }
    }
}

/// Blink Logic - Endlosschleife um `Blinker::run_once`
///
/// # Fehlerbehandlung
/// Kommandofehler unter `CommandErrorPolicy::Halt` werden geloggt und
/// beenden die Firmware per Panic.
pub async fn blink_logic<D: ChannelDriver>(mut driver: D, period_ms: u32) {
    let mut blinker = Blinker::new();
    let mut delay = Delay;
    let mut log = BlinkLog {
        channel_count: driver.channel_count(),
    };

    loop {
        if let Err(e) = blinker
            .run_once(&mut driver, &mut delay, period_ms, COMMAND_ERROR_POLICY, &mut log)
            .await
        {
            error!("LED command failed: {}", e);
            panic!("LED command failed");
        }
    }
}

/// Blink Task - Embassy Task für parallele Ausführung
///
/// # Parameter
/// - `driver`: GPIO-Treiber mit einer oder mehreren LEDs
#[embassy_executor::task]
pub async fn blink_task(driver: GpioChannelDriver<'static>) {
    blink_logic(driver, BLINK_PERIOD_MS).await;
}
