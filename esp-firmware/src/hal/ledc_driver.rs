// LEDC Channel Driver - LEDs an PWM-Kanälen mit Hardware-Fade
//
// Ein LowSpeed-Timer (5 Bit, 24 kHz) für alle Kanäle.
// Fades laufen in der LEDC-Hardware parallel; `settle()` wartet asynchron
// auf das Ende aller Fades.

use embassy_time::{Duration, Timer};
use esp_core::{ChannelDriver, Fade, Intensity, LedError, MAX_CHANNELS};
use esp_hal::gpio::{AnyPin, DriveMode};
use esp_hal::ledc::channel::{self, ChannelIFace};
use esp_hal::ledc::timer::{self, TimerIFace};
use esp_hal::ledc::{LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::time::Rate;
use heapless::Vec;
use static_cell::StaticCell;

use crate::config::{FADE_POLL_INTERVAL_MS, LEDC_DUTY, LEDC_FREQUENCY_KHZ};

/// LEDC-Kanäle in Reihenfolge der LED-Indizes (ESP32-C6 hat 6)
const CHANNEL_NUMBERS: [channel::Number; 6] = [
    channel::Number::Channel0,
    channel::Number::Channel1,
    channel::Number::Channel2,
    channel::Number::Channel3,
    channel::Number::Channel4,
    channel::Number::Channel5,
];

// Kanäle referenzieren Ledc und Timer für ihre gesamte Lebensdauer → 'static
static LEDC: StaticCell<Ledc<'static>> = StaticCell::new();
static LEDC_TIMER: StaticCell<timer::Timer<'static, LowSpeed>> = StaticCell::new();

/// Real Hardware PWM Driver
///
/// Merkt sich die zuletzt kommandierte Helligkeit jedes Kanals als
/// Startwert für den nächsten Fade.
pub struct LedcChannelDriver {
    channels: Vec<channel::Channel<'static, LowSpeed>, MAX_CHANNELS>,
    levels: Vec<Intensity, MAX_CHANNELS>,
}

impl LedcChannelDriver {
    /// Konfiguriert LEDC-Timer und einen Kanal pro Pin (Duty 0%)
    ///
    /// Darf nur einmal aufgerufen werden (statischer Timer).
    ///
    /// # Parameter
    /// - `ledc_peripheral`: LEDC Peripheral
    /// - `pins`: LED-Pins, Kanal 0 zuerst (höchstens 6)
    ///
    /// # Fehlerbehandlung
    /// `LedError::ConfigurationFailed` wenn Timer oder Kanal nicht konfiguriert werden können
    pub fn new<const N: usize>(
        ledc_peripheral: esp_hal::peripherals::LEDC<'static>,
        pins: [AnyPin<'static>; N],
    ) -> Result<Self, LedError> {
        if N == 0 || N > CHANNEL_NUMBERS.len() {
            return Err(LedError::ConfigurationFailed);
        }

        let ledc = LEDC
            .try_init(Ledc::new(ledc_peripheral))
            .ok_or(LedError::ConfigurationFailed)?;
        ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

        // Auflösung und Frequenz sind in config.rs gegen die Fade-Dauer geprüft
        let mut lstimer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
        lstimer
            .configure(timer::config::Config {
                duty: LEDC_DUTY,
                clock_source: timer::LSClockSource::APBClk,
                frequency: Rate::from_khz(LEDC_FREQUENCY_KHZ),
            })
            .map_err(|_| LedError::ConfigurationFailed)?;
        let lstimer: &'static timer::Timer<'static, LowSpeed> = LEDC_TIMER
            .try_init(lstimer)
            .ok_or(LedError::ConfigurationFailed)?;

        let mut channels = Vec::new();
        let mut levels = Vec::new();
        for (number, pin) in CHANNEL_NUMBERS.into_iter().zip(pins) {
            let mut channel = ledc.channel(number, pin);
            channel
                .configure(channel::config::Config {
                    timer: lstimer,
                    duty_pct: 0,
                    drive_mode: DriveMode::PushPull,
                })
                .map_err(|_| LedError::ConfigurationFailed)?;

            channels
                .push(channel)
                .map_err(|_| LedError::ConfigurationFailed)?;
            levels
                .push(Intensity::OFF)
                .map_err(|_| LedError::ConfigurationFailed)?;
        }

        Ok(Self { channels, levels })
    }
}

impl ChannelDriver for LedcChannelDriver {
    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Bei `Fade::Linear` wird der Hardware-Fade nur gestartet.
    ///
    /// Läuft auf dem Kanal noch ein Fade, wird zuerst dessen Ende abgewartet.
    async fn set_channel(
        &mut self,
        index: usize,
        intensity: Intensity,
        fade: Fade,
    ) -> Result<(), LedError> {
        let (Some(channel), Some(level)) =
            (self.channels.get_mut(index), self.levels.get_mut(index))
        else {
            return Err(LedError::InvalidChannel(index));
        };

        while channel.is_duty_fade_running() {
            Timer::after(Duration::from_millis(FADE_POLL_INTERVAL_MS)).await;
        }

        let start = *level;
        match fade {
            Fade::Linear { duration_ms } if duration_ms > 0 && start != intensity => {
                channel
                    .start_duty_fade(start.percent(), intensity.percent(), duration_ms)
                    .map_err(|_| LedError::WriteFailed { channel: index })?;
                *level = intensity;
            }
            _ => {
                channel
                    .set_duty(intensity.percent())
                    .map_err(|_| LedError::WriteFailed { channel: index })?;
                *level = intensity;
            }
        }

        Ok(())
    }

    /// Wartet bis kein Kanal mehr fadet
    ///
    /// Wird der Future vorher gedroppt, laufen die Fades in Hardware weiter
    /// und jeder Kanal endet trotzdem auf seiner kommandierten Helligkeit.
    async fn settle(&mut self) {
        while self.channels.iter().any(|channel| channel.is_duty_fade_running()) {
            Timer::after(Duration::from_millis(FADE_POLL_INTERVAL_MS)).await;
        }
    }
}
