// GPIO Channel Driver - LEDs direkt an Output-Pins
//
// Nur An/Aus: jede Helligkeit > 0 ist "an", Fades werden ignoriert
// und sofort umgeschaltet.

use esp_core::{ChannelDriver, Fade, Intensity, LedError, MAX_CHANNELS};
use esp_hal::gpio::{Level, Output};
use heapless::Vec;

/// Real Hardware GPIO Driver
///
/// Bindet jeden Kanal fest an einen Output-Pin (Index = Position im Array).
pub struct GpioChannelDriver<'d> {
    pins: Vec<Output<'d>, MAX_CHANNELS>,
}

impl<'d> GpioChannelDriver<'d> {
    /// Erstellt einen neuen GpioChannelDriver und schaltet alle Pins aus
    ///
    /// # Parameter
    /// - `pins`: bereits als Output konfigurierte Pins, Kanal 0 zuerst
    ///
    /// # Fehlerbehandlung
    /// `LedError::ConfigurationFailed` bei 0 oder mehr als `MAX_CHANNELS` Pins
    pub fn new<const N: usize>(pins: [Output<'d>; N]) -> Result<Self, LedError> {
        if N == 0 {
            return Err(LedError::ConfigurationFailed);
        }

        let mut outputs = Vec::new();
        for mut pin in pins {
            pin.set_low();
            outputs
                .push(pin)
                .map_err(|_| LedError::ConfigurationFailed)?;
        }

        Ok(Self { pins: outputs })
    }
}

impl ChannelDriver for GpioChannelDriver<'_> {
    fn channel_count(&self) -> usize {
        self.pins.len()
    }

    async fn set_channel(
        &mut self,
        index: usize,
        intensity: Intensity,
        _fade: Fade,
    ) -> Result<(), LedError> {
        let pin = self
            .pins
            .get_mut(index)
            .ok_or(LedError::InvalidChannel(index))?;

        pin.set_level(if intensity.is_on() {
            Level::High
        } else {
            Level::Low
        });
        Ok(())
    }
}
