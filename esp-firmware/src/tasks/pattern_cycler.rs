// Pattern Cycler Task - Muster-Rotation auf GPIO oder LEDC
use defmt::{error, info, warn};
use embassy_time::Delay;
use esp_core::{
    ChannelDriver, CyclerConfig, CyclerStatus, Fade, LoopObserver, PatternCycler, PatternKind,
    SeededRandom, StepReport,
};

use crate::StatusPublisher;
use crate::config::{GPIO_CYCLER, PWM_CYCLER};
use crate::hal::{GpioChannelDriver, LedcChannelDriver, startup_seed};

fn print_mode(pattern: PatternKind, fading: bool) {
    if fading {
        info!("Mode {}: {} (Breathing)", pattern.index(), pattern.name());
    } else {
        info!("Mode {}: {}", pattern.index(), pattern.name());
    }
}

/// Diagnose-Senke: veröffentlicht jeden Schritt und loggt Musterwechsel
struct StatusLog {
    publisher: StatusPublisher,
    fading: bool,
}

impl LoopObserver for StatusLog {
    fn on_step(&mut self, report: &StepReport, switched: bool) {
        if report.failed != 0 {
            warn!("LED commands failed (mask {=u32:#b}), continuing", report.failed);
        }

        // Ganzer Frame als ein Snapshot: Leser sehen nie einen halben Schritt
        self.publisher.publish_immediate(CyclerStatus {
            pattern: report.pattern,
            frame: report.frame.clone(),
            switched,
        });
    }

    fn on_pattern_switch(&mut self, pattern: PatternKind) {
        print_mode(pattern, self.fading);
    }
}

/// Pattern Cycler Logic - Endlosschleife um `PatternCycler::run_once`
///
/// Jeder Schritt wird als `CyclerStatus` veröffentlicht (ganzer Frame auf einmal).
///
/// # Fehlerbehandlung
/// Initialisierungsfehler und Kommandofehler unter `CommandErrorPolicy::Halt`
/// werden geloggt und beenden die Firmware per Panic.
pub async fn pattern_cycler_logic<D: ChannelDriver>(
    driver: D,
    config: CyclerConfig,
    status_publisher: StatusPublisher,
) {
    let fading = config.fade() != Fade::Instant;
    let random = SeededRandom::new(startup_seed());

    let mut cycler = match PatternCycler::initialize(driver, config, random).await {
        Ok(cycler) => cycler,
        Err(e) => {
            error!("LED initialization failed: {}", e);
            panic!("LED initialization failed");
        }
    };
    info!(
        "LED initialization completed: {} channels, rotation every {} steps",
        config.channel_count(),
        config.ticks_per_pattern()
    );
    print_mode(cycler.pattern(), fading);

    let mut delay = Delay;
    let mut log = StatusLog {
        publisher: status_publisher,
        fading,
    };

    // Hauptschleife: läuft bis zum Reset
    loop {
        if let Err(e) = cycler.run_once(&mut delay, &mut log).await {
            error!("LED command failed: {}", e);
            panic!("LED command failed");
        }
    }
}

/// GPIO Pattern Task - Muster ohne Fading (300 ms Schritte)
#[embassy_executor::task]
pub async fn gpio_pattern_task(
    driver: GpioChannelDriver<'static>,
    status_publisher: StatusPublisher,
) {
    pattern_cycler_logic(driver, GPIO_CYCLER, status_publisher).await;
}

/// PWM Pattern Task - "Atmende" Muster mit Hardware-Fade
#[embassy_executor::task]
pub async fn pwm_pattern_task(driver: LedcChannelDriver, status_publisher: StatusPublisher) {
    pattern_cycler_logic(driver, PWM_CYCLER, status_publisher).await;
}
