//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware-Zugriff
//! ohne konkrete Implementierung.

use crate::types::{Intensity, PatternKind, StepReport};

/// Fehler-Typ für LED-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedError {
    /// Peripheral (GPIO, LEDC Timer/Channel) konnte nicht konfiguriert werden
    ConfigurationFailed,
    /// Treiber hat eine andere Anzahl Kanäle als konfiguriert
    ChannelCountMismatch { expected: usize, actual: usize },
    /// Kanal-Index außerhalb von `0..channel_count`
    InvalidChannel(usize),
    /// Kommando an einen Kanal ist fehlgeschlagen
    WriteFailed { channel: usize },
}

/// Übergang von alter zu neuer Helligkeit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fade {
    /// Sofort umschalten (GPIO)
    Instant,
    /// Linear über `duration_ms` interpolieren (PWM)
    Linear { duration_ms: u16 },
}

/// Trait für den Ausgangs-Treiber
///
/// Abstrahiert N unabhängig steuerbare LED-Kanäle.
///
/// # Implementierungen
/// - **Production:** GpioChannelDriver, LedcChannelDriver (esp-firmware)
/// - **Testing:** MockChannelDriver (in-memory Mock)
#[allow(async_fn_in_trait)]
pub trait ChannelDriver {
    /// Anzahl der reservierten Kanäle (fest ab Konstruktion)
    fn channel_count(&self) -> usize;

    /// Setzt Kanal `index` auf `intensity`
    ///
    /// Bei `Fade::Linear` darf der Treiber den Übergang nur starten und
    /// sofort zurückkehren; `settle()` wartet dann auf das Ende.
    /// Treiber ohne Fade-Unterstützung schalten sofort.
    ///
    /// # Fehlerbehandlung
    /// Gibt `LedError::InvalidChannel` oder `LedError::WriteFailed` zurück
    async fn set_channel(
        &mut self,
        index: usize,
        intensity: Intensity,
        fade: Fade,
    ) -> Result<(), LedError>;

    /// Wartet, bis alle gestarteten Übergänge abgeschlossen sind
    ///
    /// Danach stehen alle Kanäle auf ihrer zuletzt kommandierten Helligkeit.
    async fn settle(&mut self) {}
}

/// Zufallsquelle für das RandomBlink-Muster
pub trait RandomSource {
    /// Unverfälschter Münzwurf
    fn coin_flip(&mut self) -> bool;
}

/// Beobachter der Hauptschleifen (Logging, Status-Channel)
///
/// Rein beobachtend: alle Methoden haben eine leere Default-Implementierung.
pub trait LoopObserver {
    /// Schritt wurde angewendet, vor dem Schlafen
    ///
    /// `switched` ist beim ersten Schritt eines Musters gesetzt.
    fn on_step(&mut self, _report: &StepReport, _switched: bool) {}

    /// Rotation zum nächsten Muster (nach dem Schlafen)
    fn on_pattern_switch(&mut self, _pattern: PatternKind) {}

    /// Blinker hat umgeschaltet, vor dem Schlafen
    ///
    /// `failed`: Bitmaske der Kanäle, deren Kommando fehlschlug
    fn on_blink(&mut self, _on: bool, _failed: u32) {}
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for LedError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            LedError::ConfigurationFailed => defmt::write!(fmt, "ConfigurationFailed"),
            LedError::ChannelCountMismatch { expected, actual } => defmt::write!(
                fmt,
                "ChannelCountMismatch {{ expected: {}, actual: {} }}",
                expected,
                actual
            ),
            LedError::InvalidChannel(index) => defmt::write!(fmt, "InvalidChannel({})", index),
            LedError::WriteFailed { channel } => {
                defmt::write!(fmt, "WriteFailed {{ channel: {} }}", channel)
            }
        }
    }
}
