//! ESP Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert Traits, Typen, die Muster-Logik und den Pattern Cycler.

#![no_std]

pub mod cycler;
pub mod logic;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use cycler::{
    CommandErrorPolicy, ConfigError, CyclerConfig, CyclerState, PatternCycler, RotationRounding,
};
pub use logic::{
    Blinker, LEDC_MAX_CYCLES_PER_STEP, SeededRandom, ledc_fade_cycles_per_step, ledc_fade_supported,
};
pub use traits::{ChannelDriver, Fade, LedError, LoopObserver, RandomSource};
pub use types::{
    CyclerStatus, Direction, Frame, Intensity, MAX_CHANNELS, PatternKind, PatternState,
    StepReport,
};
