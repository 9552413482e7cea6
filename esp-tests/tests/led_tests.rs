//! Integration Tests für Pattern Cycler und Blinker
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen MockChannelDriver

use std::cell::RefCell;

use embassy_futures::block_on;
use embedded_hal_async::delay::DelayNs;
use esp_core::{
    Blinker, ChannelDriver, CommandErrorPolicy, CyclerConfig, Fade, Frame, Intensity, LedError,
    LoopObserver, PatternCycler, PatternKind, RandomSource, RotationRounding, SeededRandom,
    StepReport,
};

// ============================================================================
// Mock Channel Driver
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub index: usize,
    pub intensity: Intensity,
    pub fade: Fade,
}

#[derive(Default)]
pub struct MockChannelDriver {
    pub channels: usize,
    pub commands: Vec<Command>,
    /// Kommandos an diesen Kanal schlagen fehl ...
    pub failing_channel: Option<usize>,
    /// ... sobald so viele Kommandos erfolgreich waren
    pub fail_after: usize,
    /// Anzahl Kommandos bei jedem `settle()`-Aufruf
    pub settled_at: Vec<usize>,
}

impl MockChannelDriver {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            ..Self::default()
        }
    }
}

impl ChannelDriver for MockChannelDriver {
    fn channel_count(&self) -> usize {
        self.channels
    }

    async fn set_channel(
        &mut self,
        index: usize,
        intensity: Intensity,
        fade: Fade,
    ) -> Result<(), LedError> {
        if index >= self.channels {
            return Err(LedError::InvalidChannel(index));
        }
        if self.failing_channel == Some(index) && self.commands.len() >= self.fail_after {
            return Err(LedError::WriteFailed { channel: index });
        }

        self.commands.push(Command {
            index,
            intensity,
            fade,
        });
        Ok(())
    }

    async fn settle(&mut self) {
        self.settled_at.push(self.commands.len());
    }
}

// ============================================================================
// Aufzeichnender Delay und Observer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Step {
        pattern: PatternKind,
        switched: bool,
        failed: u32,
    },
    Sleep(u32),
    Switch(PatternKind),
    Blink {
        on: bool,
        failed: u32,
    },
}

/// Delay ohne Wartezeit: protokolliert nur die angeforderte Dauer
pub struct RecordingDelay<'a> {
    events: &'a RefCell<Vec<Event>>,
}

impl DelayNs for RecordingDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.events.borrow_mut().push(Event::Sleep(ns / 1_000_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.events.borrow_mut().push(Event::Sleep(ms));
    }
}

pub struct RecordingObserver<'a> {
    events: &'a RefCell<Vec<Event>>,
}

impl LoopObserver for RecordingObserver<'_> {
    fn on_step(&mut self, report: &StepReport, switched: bool) {
        self.events.borrow_mut().push(Event::Step {
            pattern: report.pattern,
            switched,
            failed: report.failed,
        });
    }

    fn on_pattern_switch(&mut self, pattern: PatternKind) {
        self.events.borrow_mut().push(Event::Switch(pattern));
    }

    fn on_blink(&mut self, on: bool, failed: u32) {
        self.events.borrow_mut().push(Event::Blink { on, failed });
    }
}

fn recorders(events: &RefCell<Vec<Event>>) -> (RecordingDelay<'_>, RecordingObserver<'_>) {
    (RecordingDelay { events }, RecordingObserver { events })
}

/// Zufallsquelle mit fester Folge (wiederholt sich)
pub struct ScriptedRandom {
    flips: Vec<bool>,
    next: usize,
}

impl ScriptedRandom {
    pub fn new(flips: &[bool]) -> Self {
        Self {
            flips: flips.to_vec(),
            next: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn coin_flip(&mut self) -> bool {
        let flip = self.flips[self.next % self.flips.len()];
        self.next += 1;
        flip
    }
}

fn cycler_with<R: RandomSource>(
    config: CyclerConfig,
    random: R,
) -> PatternCycler<MockChannelDriver, R> {
    let driver = MockChannelDriver::new(config.channel_count());
    block_on(PatternCycler::initialize(driver, config, random)).unwrap()
}

fn cycler(config: CyclerConfig) -> PatternCycler<MockChannelDriver, SeededRandom> {
    cycler_with(config, SeededRandom::new(0xC0FFEE))
}

/// Ein kompletter Loop-Durchlauf ohne Timer: Schritt + Tick
fn tick<R: RandomSource>(
    cycler: &mut PatternCycler<MockChannelDriver, R>,
) -> (Frame, PatternKind) {
    let report = block_on(cycler.step()).unwrap();
    cycler.advance();
    (report.frame, report.pattern)
}

fn gpio_config() -> CyclerConfig {
    CyclerConfig::new(3, 300, 10_000).unwrap()
}

// ============================================================================
// Tests: initialize()
// ============================================================================

#[test]
fn test_initialize_commands_all_channels_off() {
    let cycler = cycler(gpio_config());

    let commands = &cycler.driver().commands;
    assert_eq!(commands.len(), 3);
    for (i, cmd) in commands.iter().enumerate() {
        assert_eq!(cmd.index, i);
        assert_eq!(cmd.intensity, Intensity::OFF);
        assert_eq!(cmd.fade, Fade::Instant);
    }
    assert_eq!(cycler.pattern(), PatternKind::KnightRider);
}

#[test]
fn test_initialize_rejects_channel_mismatch() {
    let driver = MockChannelDriver::new(2);
    let result = block_on(PatternCycler::initialize(
        driver,
        gpio_config(),
        SeededRandom::new(1),
    ));
    assert!(matches!(
        result,
        Err(LedError::ChannelCountMismatch {
            expected: 3,
            actual: 2
        })
    ));
}

#[test]
fn test_initialize_fails_on_broken_channel() {
    let mut driver = MockChannelDriver::new(3);
    driver.failing_channel = Some(1);
    let result = block_on(PatternCycler::initialize(
        driver,
        gpio_config(),
        SeededRandom::new(1),
    ));
    assert!(matches!(result, Err(LedError::WriteFailed { channel: 1 })));
}

// ============================================================================
// Tests: KnightRider
// ============================================================================

#[test]
fn test_knight_rider_exactly_one_channel_on() {
    let mut cycler = cycler(gpio_config());

    for _ in 0..cycler.config().ticks_per_pattern() {
        let (frame, pattern) = tick(&mut cycler);
        assert_eq!(pattern, PatternKind::KnightRider);
        assert_eq!(frame.on_count(), 1);
    }
}

#[test]
fn test_knight_rider_position_sequence() {
    let mut cycler = cycler(gpio_config());

    let positions: Vec<usize> = (0..9)
        .map(|_| {
            let (frame, _) = tick(&mut cycler);
            frame.iter().position(|level| level.is_on()).unwrap()
        })
        .collect();

    assert_eq!(positions, vec![0, 1, 2, 1, 0, 1, 2, 1, 0]);
}

#[test]
fn test_knight_rider_single_channel_always_on() {
    let mut cycler = cycler(CyclerConfig::new(1, 300, 10_000).unwrap());

    for _ in 0..10 {
        let (frame, _) = tick(&mut cycler);
        assert_eq!(frame.get(0), Some(Intensity::FULL));
    }
}

// ============================================================================
// Tests: BinaryCounter
// ============================================================================

#[test]
fn test_binary_counter_counts_through_all_combinations() {
    // 20 Ticks pro Muster: erst KnightRider überspringen
    let mut cycler = cycler(CyclerConfig::new(3, 100, 2000).unwrap());
    for _ in 0..20 {
        tick(&mut cycler);
    }
    assert_eq!(cycler.pattern(), PatternKind::BinaryCounter);

    let masks: Vec<u32> = (0..16).map(|_| tick(&mut cycler).0.on_mask()).collect();
    assert_eq!(masks, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7]);
}

// ============================================================================
// Tests: RandomBlink
// ============================================================================

fn skip_to_random_blink<R: RandomSource>(cycler: &mut PatternCycler<MockChannelDriver, R>) {
    while cycler.pattern() != PatternKind::RandomBlink {
        tick(cycler);
    }
}

#[test]
fn test_random_blink_uses_random_source_per_channel() {
    let random = ScriptedRandom::new(&[true, false, true, false, false, true]);
    let mut cycler = cycler_with(CyclerConfig::new(3, 1000, 2000).unwrap(), random);
    skip_to_random_blink(&mut cycler);

    assert_eq!(tick(&mut cycler).0.on_mask(), 0b101);
    assert_eq!(tick(&mut cycler).0.on_mask(), 0b100);
}

#[test]
fn test_random_blink_mean_close_to_half() {
    // 20_000 Ticks pro Muster: RandomBlink bleibt für alle Schritte aktiv
    let mut cycler = cycler(CyclerConfig::new(3, 1, 20_000).unwrap());
    skip_to_random_blink(&mut cycler);

    let steps = 10_000;
    let mut on_counts = [0u32; 3];
    for _ in 0..steps {
        let (frame, pattern) = tick(&mut cycler);
        assert_eq!(pattern, PatternKind::RandomBlink);
        for (i, level) in frame.iter().enumerate() {
            if level.is_on() {
                on_counts[i] += 1;
            }
        }
    }

    for count in on_counts {
        let mean = count as f64 / steps as f64;
        assert!((mean - 0.5).abs() < 0.05, "mean {} too far from 0.5", mean);
    }
}

// ============================================================================
// Tests: Rotation
// ============================================================================

#[test]
fn test_rotation_every_34_steps_in_fixed_order() {
    let mut cycler = cycler(gpio_config());

    let mut switches = Vec::new();
    for step in 1..=34 * 4 {
        block_on(cycler.step()).unwrap();
        if let Some(next) = cycler.advance() {
            switches.push((step, next));
        }
    }

    assert_eq!(
        switches,
        vec![
            (34, PatternKind::BinaryCounter),
            (68, PatternKind::RandomBlink),
            (102, PatternKind::KnightRider),
            (136, PatternKind::BinaryCounter),
        ]
    );
}

#[test]
fn test_rotation_truncating_every_33_steps() {
    let config = gpio_config().with_rounding(RotationRounding::Truncate);
    let mut cycler = cycler(config);

    let switch_steps: Vec<u32> = (1..=99)
        .filter(|_| {
            block_on(cycler.step()).unwrap();
            cycler.advance().is_some()
        })
        .collect();

    assert_eq!(switch_steps, vec![33, 66, 99]);
}

#[test]
fn test_knight_rider_restarts_at_position_zero_after_rotation() {
    let mut cycler = cycler(CyclerConfig::new(3, 1000, 2000).unwrap());
    for _ in 0..6 {
        tick(&mut cycler);
    }
    assert_eq!(cycler.pattern(), PatternKind::KnightRider);
    assert_eq!(tick(&mut cycler).0.on_mask(), 0b001);
}

// ============================================================================
// Tests: Determinismus
// ============================================================================

#[test]
fn test_same_seed_reproduces_sequence() {
    let config = CyclerConfig::new(3, 1000, 5000).unwrap();
    let mut a = cycler_with(config, SeededRandom::new(99));
    let mut b = cycler_with(config, SeededRandom::new(99));

    for _ in 0..50 {
        assert_eq!(tick(&mut a), tick(&mut b));
    }
    assert_eq!(a.driver().commands, b.driver().commands);
}

// ============================================================================
// Tests: Anwenden auf den Treiber
// ============================================================================

#[test]
fn test_only_changed_channels_are_commanded() {
    let mut cycler = cycler(gpio_config());
    let init_commands = cycler.driver().commands.len();

    // Position 0 an, Kanäle 1 und 2 waren schon aus
    let report = block_on(cycler.step()).unwrap();
    assert_eq!(report.changed, 0b001);
    assert_eq!(cycler.driver().commands.len(), init_commands + 1);

    // Position 1: Kanal 0 aus, Kanal 1 an
    let report = block_on(cycler.step()).unwrap();
    assert_eq!(report.changed, 0b011);
    assert_eq!(cycler.driver().commands.len(), init_commands + 3);
}

#[test]
fn test_fade_uses_tenth_of_pattern_duration() {
    let config = CyclerConfig::new(3, 1000, 10_000).unwrap().with_fade(true);
    let mut cycler = cycler(config);

    block_on(cycler.step()).unwrap();

    let last = cycler.driver().commands.last().copied().unwrap();
    assert_eq!(last.index, 0);
    assert_eq!(last.intensity, Intensity::FULL);
    assert_eq!(last.fade, Fade::Linear { duration_ms: 1000 });
}

#[test]
fn test_fades_start_together_and_settle_once_per_step() {
    let config = CyclerConfig::new(3, 1000, 10_000).unwrap().with_fade(true);
    let mut cycler = cycler(config);
    // initialize: sofort aus, kein Warten nötig
    assert!(cycler.driver().settled_at.is_empty());

    // Position 0: ein Kanal
    block_on(cycler.step()).unwrap();
    assert_eq!(cycler.driver().settled_at, vec![4]);

    // Position 1: Kanal 0 aus und Kanal 1 an, beide gestartet vor dem Warten
    let report = block_on(cycler.step()).unwrap();
    assert_eq!(report.changed, 0b011);
    assert_eq!(cycler.driver().settled_at, vec![4, 6]);

    let fades: Vec<Fade> = cycler.driver().commands[4..].iter().map(|cmd| cmd.fade).collect();
    assert_eq!(fades, vec![Fade::Linear { duration_ms: 1000 }; 2]);
}

#[test]
fn test_unchanged_frame_does_not_settle() {
    // RandomBlink immer aus: ab dem zweiten Schritt ändert sich nichts
    let random = ScriptedRandom::new(&[false]);
    let config = CyclerConfig::new(3, 1000, 1000).unwrap().with_fade(true);
    let mut cycler = cycler_with(config, random);
    skip_to_random_blink(&mut cycler);
    let settles = cycler.driver().settled_at.len();

    let report = tick(&mut cycler);
    assert_eq!(report.0.on_mask(), 0);
    assert_eq!(cycler.driver().settled_at.len(), settles);
}

fn failing_after_init(
    channel: usize,
    policy: CommandErrorPolicy,
) -> PatternCycler<MockChannelDriver, SeededRandom> {
    let mut driver = MockChannelDriver::new(3);
    driver.failing_channel = Some(channel);
    driver.fail_after = 3;
    let config = gpio_config().with_error_policy(policy);
    block_on(PatternCycler::initialize(driver, config, SeededRandom::new(1))).unwrap()
}

#[test]
fn test_halt_policy_returns_first_error() {
    let mut cycler = failing_after_init(1, CommandErrorPolicy::Halt);

    // Position 0: nur Kanal 0
    assert!(block_on(cycler.step()).is_ok());
    // Position 1: Kanal 1 schlägt fehl
    let result = block_on(cycler.step());
    assert_eq!(result, Err(LedError::WriteFailed { channel: 1 }));
}

#[test]
fn test_ignore_policy_reports_and_continues() {
    let mut cycler = failing_after_init(1, CommandErrorPolicy::Ignore);

    block_on(cycler.step()).unwrap();
    let report = block_on(cycler.step()).unwrap();
    assert_eq!(report.changed, 0b011);
    assert_eq!(report.failed, 0b010);
    // Kanal 1 behält den zuletzt erfolgreich kommandierten Wert
    assert_eq!(cycler.frame().get(1), Some(Intensity::OFF));
    assert_eq!(cycler.frame().get(0), Some(Intensity::OFF));

    // Position 2: Kanal 1 soll aus sein und ist es schon
    let report = block_on(cycler.step()).unwrap();
    assert_eq!(report.changed, 0b100);
    assert_eq!(report.failed, 0);
}

// ============================================================================
// Tests: Blinker
// ============================================================================

#[test]
fn test_blinker_drives_group_together() {
    let events = RefCell::new(Vec::new());
    let (mut delay, mut observer) = recorders(&events);
    let mut driver = MockChannelDriver::new(3);
    let mut blinker = Blinker::new();

    for _ in 0..4 {
        block_on(blinker.run_once(
            &mut driver,
            &mut delay,
            1000,
            CommandErrorPolicy::Halt,
            &mut observer,
        ))
        .unwrap();
    }

    let levels: Vec<bool> = driver
        .commands
        .chunks(3)
        .map(|group| {
            assert!(group.iter().all(|cmd| cmd.intensity == group[0].intensity));
            group[0].intensity.is_on()
        })
        .collect();
    assert_eq!(levels, vec![true, false, true, false]);

    // Kommandos und Meldung vor dem Schlafen
    assert_eq!(
        events.into_inner(),
        vec![
            Event::Blink { on: true, failed: 0 },
            Event::Sleep(1000),
            Event::Blink { on: false, failed: 0 },
            Event::Sleep(1000),
            Event::Blink { on: true, failed: 0 },
            Event::Sleep(1000),
            Event::Blink { on: false, failed: 0 },
            Event::Sleep(1000),
        ]
    );
}

#[test]
fn test_blinker_single_led_toggles_every_period() {
    let events = RefCell::new(Vec::new());
    let (mut delay, mut observer) = recorders(&events);
    let mut driver = MockChannelDriver::new(1);
    let mut blinker = Blinker::new();

    let states: Vec<bool> = (0..3)
        .map(|_| {
            block_on(blinker.run_once(
                &mut driver,
                &mut delay,
                1000,
                CommandErrorPolicy::Halt,
                &mut observer,
            ))
            .unwrap()
        })
        .collect();

    assert_eq!(states, vec![true, false, true]);
    assert_eq!(driver.commands.len(), 3);
    assert!(driver.commands.iter().all(|cmd| cmd.fade == Fade::Instant));
}

#[test]
fn test_blinker_halt_policy_stops_before_sleeping() {
    let events = RefCell::new(Vec::new());
    let (mut delay, mut observer) = recorders(&events);
    let mut driver = MockChannelDriver::new(3);
    driver.failing_channel = Some(2);
    let mut blinker = Blinker::new();

    let result = block_on(blinker.run_once(
        &mut driver,
        &mut delay,
        1000,
        CommandErrorPolicy::Halt,
        &mut observer,
    ));

    assert_eq!(result, Err(LedError::WriteFailed { channel: 2 }));
    assert!(events.borrow().is_empty());
}

#[test]
fn test_blinker_ignore_policy_reports_failed_channels() {
    let events = RefCell::new(Vec::new());
    let (mut delay, mut observer) = recorders(&events);
    let mut driver = MockChannelDriver::new(3);
    driver.failing_channel = Some(1);
    let mut blinker = Blinker::new();

    let on = block_on(blinker.run_once(
        &mut driver,
        &mut delay,
        1000,
        CommandErrorPolicy::Ignore,
        &mut observer,
    ))
    .unwrap();

    assert!(on);
    assert_eq!(driver.commands.len(), 2);
    assert_eq!(
        events.into_inner(),
        vec![Event::Blink { on: true, failed: 0b010 }, Event::Sleep(1000)]
    );
}

// ============================================================================
// Tests: Hauptschleife des Cyclers
// ============================================================================

#[test]
fn test_run_once_steps_reports_sleeps_then_rotates() {
    let events = RefCell::new(Vec::new());
    let (mut delay, mut observer) = recorders(&events);
    // 2 Ticks pro Muster
    let mut cycler = cycler(CyclerConfig::new(3, 1000, 2000).unwrap());

    let switches: Vec<Option<PatternKind>> = (0..3)
        .map(|_| block_on(cycler.run_once(&mut delay, &mut observer)).unwrap())
        .collect();

    assert_eq!(switches, vec![None, Some(PatternKind::BinaryCounter), None]);
    assert_eq!(
        events.into_inner(),
        vec![
            Event::Step {
                pattern: PatternKind::KnightRider,
                switched: true,
                failed: 0
            },
            Event::Sleep(1000),
            Event::Step {
                pattern: PatternKind::KnightRider,
                switched: false,
                failed: 0
            },
            Event::Sleep(1000),
            Event::Switch(PatternKind::BinaryCounter),
            Event::Step {
                pattern: PatternKind::BinaryCounter,
                switched: true,
                failed: 0
            },
            Event::Sleep(1000),
        ]
    );
}

#[test]
fn test_run_once_sleeps_step_period() {
    let events = RefCell::new(Vec::new());
    let (mut delay, mut observer) = recorders(&events);
    let mut cycler = cycler(gpio_config());

    for _ in 0..cycler.config().ticks_per_pattern() {
        block_on(cycler.run_once(&mut delay, &mut observer)).unwrap();
    }

    let events = events.into_inner();
    let sleeps = events
        .iter()
        .filter(|event| **event == Event::Sleep(300))
        .count();
    assert_eq!(sleeps, 34);
    assert_eq!(events.last(), Some(&Event::Switch(PatternKind::BinaryCounter)));
}

#[test]
fn test_run_once_halt_policy_returns_error_without_sleeping() {
    let events = RefCell::new(Vec::new());
    let (mut delay, mut observer) = recorders(&events);
    let mut cycler = failing_after_init(0, CommandErrorPolicy::Halt);

    let result = block_on(cycler.run_once(&mut delay, &mut observer));

    assert_eq!(result, Err(LedError::WriteFailed { channel: 0 }));
    assert!(events.borrow().is_empty());
}

#[test]
fn test_run_once_ignore_policy_reports_failure_and_keeps_running() {
    let events = RefCell::new(Vec::new());
    let (mut delay, mut observer) = recorders(&events);
    let mut cycler = failing_after_init(0, CommandErrorPolicy::Ignore);

    block_on(cycler.run_once(&mut delay, &mut observer)).unwrap();

    assert_eq!(
        events.into_inner(),
        vec![
            Event::Step {
                pattern: PatternKind::KnightRider,
                switched: true,
                failed: 0b001
            },
            Event::Sleep(300),
        ]
    );
}
