//! Pure Business Logic Functions
//!
//! Muster-Schritte, Blinker und Zufallsquelle ohne Hardware-Dependencies (testbar!)

use embedded_hal_async::delay::DelayNs;

use crate::cycler::CommandErrorPolicy;
use crate::traits::{ChannelDriver, Fade, LedError, LoopObserver, RandomSource};
use crate::types::{Direction, Frame, Intensity, PatternState};

impl PatternState {
    /// Berechnet den Frame für diesen Schritt und rückt den Zustand weiter
    ///
    /// # Beispiele
    ///
    /// ```
    /// # use esp_core::{PatternKind, PatternState, SeededRandom};
    /// let mut state = PatternState::initial(PatternKind::BinaryCounter);
    /// let mut rng = SeededRandom::new(1);
    /// let frame = state.step(3, &mut rng);   // Zähler 0
    /// assert_eq!(frame.on_mask(), 0b000);
    /// let frame = state.step(3, &mut rng);   // Zähler 1
    /// assert_eq!(frame.on_mask(), 0b001);
    /// ```
    pub fn step<R: RandomSource>(&mut self, channel_count: usize, rng: &mut R) -> Frame {
        match self {
            PatternState::KnightRider {
                position,
                direction,
            } => {
                let mut frame = Frame::off(channel_count);
                frame.set(*position, Intensity::FULL);
                (*position, *direction) = bounce(*position, *direction, channel_count);
                frame
            }
            PatternState::BinaryCounter { counter } => {
                let frame = Frame::from_bits(channel_count, *counter);
                *counter = (*counter + 1) % (1u32 << channel_count.min(31));
                frame
            }
            PatternState::RandomBlink => {
                let mut frame = Frame::off(channel_count);
                for i in 0..frame.len() {
                    frame.set(i, Intensity::from_on(rng.coin_flip()));
                }
                frame
            }
        }
    }
}

/// Knight-Rider-Bewegung mit inklusivem Abprallen an 0 und `channel_count - 1`
///
/// Mit nur einem Kanal bleibt die Position 0, die Richtung kippt jeden Schritt.
fn bounce(position: usize, direction: Direction, channel_count: usize) -> (usize, Direction) {
    let last = channel_count.saturating_sub(1);
    if last == 0 {
        return (0, direction.reversed());
    }

    let next = match direction {
        Direction::Forward => (position + 1).min(last),
        Direction::Backward => position.saturating_sub(1),
    };

    if next == 0 || next == last {
        (next, direction.reversed())
    } else {
        (next, direction)
    }
}

/// Ein/Aus-Umschalter für die einfachen Blink-Demos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blinker {
    on: bool,
}

impl Blinker {
    /// Startet ausgeschaltet
    pub const fn new() -> Self {
        Self { on: false }
    }

    /// Kippt den Zustand und gibt den neuen Zustand zurück
    pub fn toggle(&mut self) -> bool {
        self.on = !self.on;
        self.on
    }

    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Alle Kanäle auf dem aktuellen Zustand
    pub fn frame(&self, channel_count: usize) -> Frame {
        Frame::uniform(channel_count, Intensity::from_on(self.on))
    }

    /// Ein Durchlauf der Blink-Schleife: umschalten, alle Kanäle setzen,
    /// melden, `period_ms` schlafen
    ///
    /// # Fehlerbehandlung
    /// `CommandErrorPolicy::Halt` gibt den ersten Fehler sofort zurück,
    /// `Ignore` meldet die Kanäle als Bitmaske an `observer`.
    pub async fn run_once<D, T, O>(
        &mut self,
        driver: &mut D,
        delay: &mut T,
        period_ms: u32,
        policy: CommandErrorPolicy,
        observer: &mut O,
    ) -> Result<bool, LedError>
    where
        D: ChannelDriver,
        T: DelayNs,
        O: LoopObserver,
    {
        let on = self.toggle();
        let mut failed = 0u32;

        for (index, level) in self.frame(driver.channel_count()).iter().enumerate() {
            if let Err(e) = driver.set_channel(index, level, Fade::Instant).await {
                match policy {
                    CommandErrorPolicy::Halt => return Err(e),
                    CommandErrorPolicy::Ignore => failed |= 1 << index,
                }
            }
        }

        observer.on_blink(on, failed);
        delay.delay_ms(period_ms).await;
        Ok(on)
    }
}

/// Pseudo-Zufallsquelle (xorshift32)
///
/// Wird einmal beim Start geseedet. Seed 0 wäre ein Fixpunkt und wird ersetzt.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    const FALLBACK_SEED: u32 = 0x9E37_79B9;

    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl RandomSource for SeededRandom {
    fn coin_flip(&mut self) -> bool {
        self.next_u32() >> 31 == 1
    }
}

// ============================================================================
// LEDC Fade-Timing
// ============================================================================

/// Obergrenze der LEDC-Hardware: PWM-Perioden pro Duty-Schritt (10 Bit)
pub const LEDC_MAX_CYCLES_PER_STEP: u32 = 1023;

/// PWM-Perioden pro Duty-Schritt eines Hardware-Fades von `start` nach `end`
///
/// Gleiche Integer-Arithmetik wie `start_duty_fade` in `esp_hal::ledc`:
/// Duty-Bereich `2^duty_bits - 1`, Prozent abgeschnitten, Perioden =
/// `duration_ms * frequency_hz / 1000`. Ohne Duty-Änderung 0.
pub const fn ledc_fade_cycles_per_step(
    duration_ms: u16,
    frequency_hz: u32,
    duty_bits: u32,
    start: Intensity,
    end: Intensity,
) -> u32 {
    let duty_range = (1u32 << duty_bits) - 1;
    let start_duty = duty_range * start.percent() as u32 / 100;
    let end_duty = duty_range * end.percent() as u32 / 100;
    let duty_steps = start_duty.abs_diff(end_duty);
    if duty_steps == 0 {
        return 0;
    }

    let pwm_cycles = duration_ms as u64 * frequency_hz as u64 / 1000;
    let cycles = pwm_cycles / duty_steps as u64;
    if cycles > u32::MAX as u64 {
        u32::MAX
    } else {
        cycles as u32
    }
}

/// Kann die LEDC-Hardware diesen Fade in `duration_ms` ausführen?
///
/// 0 Perioden pro Schritt (zu viele Duty-Stufen für die Dauer) und mehr
/// als `LEDC_MAX_CYCLES_PER_STEP` lehnt `start_duty_fade` ab oder fadet
/// mit falscher Dauer.
pub const fn ledc_fade_supported(
    duration_ms: u16,
    frequency_hz: u32,
    duty_bits: u32,
    start: Intensity,
    end: Intensity,
) -> bool {
    let cycles = ledc_fade_cycles_per_step(duration_ms, frequency_hz, duty_bits, start, end);
    cycles >= 1 && cycles <= LEDC_MAX_CYCLES_PER_STEP
}
