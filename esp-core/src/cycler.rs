//! Pattern Cycler
//!
//! Treibt N Kanäle durch die feste Rotation KnightRider → BinaryCounter →
//! RandomBlink. Pro Tick ein Schritt des aktiven Musters, nach einer festen
//! Anzahl Ticks Wechsel zum nächsten Muster.
//!
//! Ein Durchlauf der Hauptschleife (`run_once`):
//!
//! ```text
//! cycler.step().await?;         // 1. Frame berechnen, 2. anwenden (Fades parallel)
//! observer.on_step(..);         //    Status melden
//! delay.delay_ms(step).await;   // 3. schlafen
//! cycler.advance();             // 4. Tick zählen, ggf. rotieren
//! ```
//!
//! Die Zeitbasis kommt als `DelayNs` von außen (`embassy_time::Delay` in der
//! Firmware, aufzeichnender Delay in Tests).

use embedded_hal_async::delay::DelayNs;

use crate::traits::{ChannelDriver, Fade, LedError, LoopObserver, RandomSource};
use crate::types::{Frame, Intensity, MAX_CHANNELS, PatternKind, PatternState, StepReport};

/// Fehler-Typ für ungültige Cycler-Parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ZeroStepPeriod,
    /// Kanalanzahl außerhalb von `1..=MAX_CHANNELS`
    ChannelCount(usize),
}

/// Rundung der Ticks pro Muster bei `duration / step` mit Rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationRounding {
    /// `ceil(duration / step)`: das Muster läuft mindestens `duration`
    #[default]
    Ceil,
    /// `duration / step`: abgeschnitten, das Muster läuft höchstens `duration`
    Truncate,
}

/// Verhalten bei fehlgeschlagenem Kanal-Kommando nach der Initialisierung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandErrorPolicy {
    /// Schritt bricht mit dem Fehler ab (Firmware loggt und hält an)
    #[default]
    Halt,
    /// Fehler melden und mit den restlichen Kanälen weitermachen
    Ignore,
}

/// Parameter des Cyclers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclerConfig {
    channel_count: usize,
    step_period_ms: u32,
    pattern_duration_ms: u32,
    fade: bool,
    rounding: RotationRounding,
    error_policy: CommandErrorPolicy,
}

impl CyclerConfig {
    /// Erstellt eine Konfiguration ohne Fading, mit `Ceil`-Rundung und `Halt`
    pub const fn new(
        channel_count: usize,
        step_period_ms: u32,
        pattern_duration_ms: u32,
    ) -> Result<Self, ConfigError> {
        if channel_count == 0 || channel_count > MAX_CHANNELS {
            return Err(ConfigError::ChannelCount(channel_count));
        }
        if step_period_ms == 0 {
            return Err(ConfigError::ZeroStepPeriod);
        }
        Ok(Self {
            channel_count,
            step_period_ms,
            pattern_duration_ms,
            fade: false,
            rounding: RotationRounding::Ceil,
            error_policy: CommandErrorPolicy::Halt,
        })
    }

    pub const fn with_fade(mut self, fade: bool) -> Self {
        self.fade = fade;
        self
    }

    pub const fn with_rounding(mut self, rounding: RotationRounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub const fn with_error_policy(mut self, error_policy: CommandErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub const fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub const fn step_period_ms(&self) -> u32 {
        self.step_period_ms
    }

    pub const fn pattern_duration_ms(&self) -> u32 {
        self.pattern_duration_ms
    }

    pub const fn error_policy(&self) -> CommandErrorPolicy {
        self.error_policy
    }

    /// Ticks bis zur Rotation, mindestens 1
    pub const fn ticks_per_pattern(&self) -> u32 {
        let ticks = match self.rounding {
            RotationRounding::Ceil => self.pattern_duration_ms.div_ceil(self.step_period_ms),
            RotationRounding::Truncate => self.pattern_duration_ms / self.step_period_ms,
        };
        if ticks == 0 { 1 } else { ticks }
    }

    /// Übergang für geänderte Kanäle: ein Zehntel der Musterdauer, falls Fading aktiv
    pub const fn fade(&self) -> Fade {
        if !self.fade {
            return Fade::Instant;
        }
        let duration_ms = self.pattern_duration_ms / 10;
        Fade::Linear {
            duration_ms: if duration_ms > u16::MAX as u32 {
                u16::MAX
            } else {
                duration_ms as u16
            },
        }
    }
}

/// Veränderlicher Zustand des Cyclers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclerState {
    pub pattern: PatternState,
    /// Ticks seit der letzten Rotation
    pub ticks: u32,
}

impl CyclerState {
    /// Startzustand: KnightRider auf Position 0, vorwärts
    pub const fn new() -> Self {
        Self {
            pattern: PatternState::initial(PatternKind::KnightRider),
            ticks: 0,
        }
    }

    pub const fn pattern_index(&self) -> usize {
        self.pattern.kind().index()
    }
}

impl Default for CyclerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Pattern Cycler - besitzt Treiber, Zufallsquelle und Zustand
///
/// # Trait-basierte Abstraktion
/// - `D: ChannelDriver` - GPIO/LEDC im Production-Code, Mock in Tests
/// - `R: RandomSource` - SeededRandom im Production-Code, Skript in Tests
pub struct PatternCycler<D, R> {
    driver: D,
    random: R,
    config: CyclerConfig,
    state: CyclerState,
    /// Zuletzt kommandierter Frame
    frame: Frame,
    /// Erster Schritt des aktiven Musters steht noch aus
    switched: bool,
}

impl<D: ChannelDriver, R: RandomSource> PatternCycler<D, R> {
    /// Prüft den Treiber gegen die Konfiguration und schaltet alle Kanäle aus
    ///
    /// # Fehlerbehandlung
    /// Jeder Fehler ist fatal für den Aufrufer (kein Retry).
    pub async fn initialize(
        mut driver: D,
        config: CyclerConfig,
        random: R,
    ) -> Result<Self, LedError> {
        let actual = driver.channel_count();
        if actual != config.channel_count() {
            return Err(LedError::ChannelCountMismatch {
                expected: config.channel_count(),
                actual,
            });
        }

        for index in 0..actual {
            driver
                .set_channel(index, Intensity::OFF, Fade::Instant)
                .await?;
        }

        Ok(Self {
            driver,
            random,
            config,
            state: CyclerState::new(),
            frame: Frame::off(actual),
            switched: true,
        })
    }

    /// Berechnet den nächsten Frame und wendet ihn auf die geänderten Kanäle an
    ///
    /// Alle Übergänge werden zuerst gestartet, danach wird auf alle
    /// gemeinsam gewartet (`ChannelDriver::settle`). Ein Schritt dauert
    /// mit Fading also einmal die Fade-Dauer, nicht einmal pro Kanal.
    pub async fn step(&mut self) -> Result<StepReport, LedError> {
        let pattern = self.state.pattern.kind();
        let next = self
            .state
            .pattern
            .step(self.config.channel_count(), &mut self.random);

        let fade = self.config.fade();
        let mut changed = 0u32;
        let mut failed = 0u32;

        for (index, target) in next.iter().enumerate() {
            if self.frame.get(index) == Some(target) {
                continue;
            }
            changed |= 1 << index;

            match self.driver.set_channel(index, target, fade).await {
                Ok(()) => self.frame.set(index, target),
                Err(e) => match self.config.error_policy() {
                    CommandErrorPolicy::Halt => {
                        self.driver.settle().await;
                        return Err(e);
                    }
                    CommandErrorPolicy::Ignore => failed |= 1 << index,
                },
            }
        }

        if changed != 0 {
            self.driver.settle().await;
        }

        Ok(StepReport {
            pattern,
            frame: self.frame.clone(),
            changed,
            failed,
        })
    }

    /// Zählt einen Tick; gibt bei Rotation das neue Muster zurück
    pub fn advance(&mut self) -> Option<PatternKind> {
        self.state.ticks += 1;
        if self.state.ticks < self.config.ticks_per_pattern() {
            return None;
        }

        let next = self.state.pattern.kind().next();
        self.state = CyclerState {
            pattern: PatternState::initial(next),
            ticks: 0,
        };
        self.switched = true;
        Some(next)
    }

    /// Ein Durchlauf der Endlosschleife
    ///
    /// Schritt anwenden, an `observer` melden, `step_period_ms` schlafen,
    /// Tick zählen. Gibt bei Rotation das neue Muster zurück.
    ///
    /// # Fehlerbehandlung
    /// Kommandofehler unter `CommandErrorPolicy::Halt` werden sofort
    /// zurückgegeben, ohne zu schlafen.
    pub async fn run_once<T: DelayNs, O: LoopObserver>(
        &mut self,
        delay: &mut T,
        observer: &mut O,
    ) -> Result<Option<PatternKind>, LedError> {
        let report = self.step().await?;
        observer.on_step(&report, self.switched);
        self.switched = false;

        delay.delay_ms(self.config.step_period_ms()).await;

        let next = self.advance();
        if let Some(pattern) = next {
            observer.on_pattern_switch(pattern);
        }
        Ok(next)
    }

    pub fn state(&self) -> &CyclerState {
        &self.state
    }

    pub fn pattern(&self) -> PatternKind {
        self.state.pattern.kind()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn config(&self) -> &CyclerConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ConfigError::ZeroStepPeriod => defmt::write!(fmt, "ZeroStepPeriod"),
            ConfigError::ChannelCount(n) => defmt::write!(fmt, "ChannelCount({})", n),
        }
    }
}
