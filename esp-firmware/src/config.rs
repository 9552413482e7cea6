// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen

use esp_core::{CommandErrorPolicy, CyclerConfig, Fade, Intensity, ledc_fade_supported};
use esp_hal::ledc::timer::config::Duty;

// ============================================================================
// LED Konfiguration
// ============================================================================

/// GPIO-Pins der drei LEDs (Kanal 0, 1, 2)
/// Die Einzel-LED-Demo nutzt nur den ersten Pin
pub const LED_GPIO_PINS: [u8; 3] = [2, 4, 5];

/// Anzahl der LEDs für Gruppen- und Muster-Demos
pub const LED_COUNT: usize = LED_GPIO_PINS.len();

// ============================================================================
// Blink-Demos (blink, blink-group)
// ============================================================================

/// Blink-Intervall in Millisekunden
pub const BLINK_PERIOD_MS: u32 = 1000;

// ============================================================================
// Pattern Cycler (patterns, breathing)
// ============================================================================

/// Dauer eines Musters bis zur Rotation
/// Alle 10 Sekunden wechselt das Muster
pub const PATTERN_DURATION_MS: u32 = 10_000;

/// Schrittweite der GPIO-Muster-Demo
pub const GPIO_STEP_PERIOD_MS: u32 = 300;

/// Schrittweite der PWM-Demo
/// Entspricht der Fade-Dauer (PATTERN_DURATION_MS / 10): ein "Atemzug" pro Schritt
pub const PWM_STEP_PERIOD_MS: u32 = 1000;

/// Verhalten bei fehlgeschlagenem Kanal-Kommando
/// Halt: loggen und anhalten (Panic → esp-backtrace)
pub const COMMAND_ERROR_POLICY: CommandErrorPolicy = CommandErrorPolicy::Halt;

// ============================================================================
// LEDC (PWM) Konfiguration
// ============================================================================

/// PWM-Frequenz in kHz
pub const LEDC_FREQUENCY_KHZ: u32 = 24;

/// Duty-Auflösung des LEDC-Timers
/// 5 Bit = 31 Stufen: bei 24 kHz 774 PWM-Perioden pro Stufe für 1 s Fade
pub const LEDC_DUTY: Duty = Duty::Duty5Bit;

/// Bitzahl von `LEDC_DUTY` (für die Fade-Prüfung unten)
pub const LEDC_DUTY_BITS: u32 = 5;

/// Abfrage-Intervall während eines Hardware-Fades in Millisekunden
/// Der Task gibt dazwischen die CPU ab
pub const FADE_POLL_INTERVAL_MS: u64 = 5;

// ============================================================================
// Status-Channel Konfiguration
// ============================================================================

/// Nachrichten-Kapazität des Status-Channels
pub const STATUS_CHANNEL_CAPACITY: usize = 4;

// ============================================================================
// Cycler-Konfigurationen (zur Compile-Zeit geprüft)
// ============================================================================

/// GPIO-Muster: 300 ms Schritte, sofortiges Umschalten
pub const GPIO_CYCLER: CyclerConfig =
    match CyclerConfig::new(LED_COUNT, GPIO_STEP_PERIOD_MS, PATTERN_DURATION_MS) {
        Ok(config) => config.with_error_policy(COMMAND_ERROR_POLICY),
        Err(_) => panic!("invalid GPIO cycler configuration"),
    };

/// PWM-Muster: 1000 ms Schritte, Fade über PATTERN_DURATION_MS / 10
///
/// Alle Fades eines Schritts laufen parallel, ein Schritt dauert damit
/// Fade + Schlafen (1 s + 1 s). Die 10 Ticks eines Musters ergeben also
/// rund 20 s Wanduhrzeit, nicht 10 s.
pub const PWM_CYCLER: CyclerConfig =
    match CyclerConfig::new(LED_COUNT, PWM_STEP_PERIOD_MS, PATTERN_DURATION_MS) {
        Ok(config) => config
            .with_fade(true)
            .with_error_policy(COMMAND_ERROR_POLICY),
        Err(_) => panic!("invalid PWM cycler configuration"),
    };

// LEDC muss den vollen An/Aus-Fade in der konfigurierten Dauer schaffen
const _: () = {
    let Fade::Linear { duration_ms } = PWM_CYCLER.fade() else {
        panic!("PWM cycler must fade");
    };
    assert!(
        ledc_fade_supported(
            duration_ms,
            LEDC_FREQUENCY_KHZ * 1000,
            LEDC_DUTY_BITS,
            Intensity::OFF,
            Intensity::FULL,
        ),
        "LEDC fade timing outside hardware limits (duty bits / frequency / fade duration)"
    );
};
