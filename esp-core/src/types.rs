//! Core Types für LED-Muster
//!
//! Datenstrukturen ohne Hardware-Dependencies

use heapless::Vec;

/// Maximale Anzahl Kanäle, die ein Frame aufnehmen kann
pub const MAX_CHANNELS: usize = 8;

/// Helligkeit eines Kanals in Prozent (0-100)
///
/// Prozent passt direkt auf die Duty-API des LEDC-Peripherals.
/// Der GPIO-Treiber wertet jeden Wert > 0 als "an".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Intensity(u8);

impl Intensity {
    pub const OFF: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Erstellt eine Helligkeit, Werte über 100 werden begrenzt
    pub const fn from_percent(percent: u8) -> Self {
        if percent > 100 { Self::FULL } else { Self(percent) }
    }

    pub const fn from_on(on: bool) -> Self {
        if on { Self::FULL } else { Self::OFF }
    }

    pub const fn percent(self) -> u8 {
        self.0
    }

    pub const fn is_on(self) -> bool {
        self.0 > 0
    }
}

/// Kommandierte Helligkeit aller Kanäle für einen Schritt
///
/// Wird als Einheit angewendet und veröffentlicht, damit ein Leser
/// nie einen halb angewendeten Schritt sieht.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    levels: Vec<Intensity, MAX_CHANNELS>,
}

impl Frame {
    /// Alle Kanäle aus (maximal `MAX_CHANNELS`)
    pub fn off(channel_count: usize) -> Self {
        Self::uniform(channel_count, Intensity::OFF)
    }

    pub fn uniform(channel_count: usize, intensity: Intensity) -> Self {
        let mut levels = Vec::new();
        for _ in 0..channel_count.min(MAX_CHANNELS) {
            let _ = levels.push(intensity);
        }
        Self { levels }
    }

    /// Kanal `i` ist an, wenn Bit `i` von `bits` gesetzt ist (Kanal 0 = LSB)
    pub fn from_bits(channel_count: usize, bits: u32) -> Self {
        let mut frame = Self::off(channel_count);
        for (i, level) in frame.levels.iter_mut().enumerate() {
            *level = Intensity::from_on((bits >> i) & 1 == 1);
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Intensity> {
        self.levels.get(index).copied()
    }

    /// Setzt Kanal `index`; Indizes außerhalb des Frames werden ignoriert
    pub fn set(&mut self, index: usize, intensity: Intensity) {
        if let Some(level) = self.levels.get_mut(index) {
            *level = intensity;
        }
    }

    pub fn as_slice(&self) -> &[Intensity] {
        &self.levels
    }

    pub fn iter(&self) -> impl Iterator<Item = Intensity> + '_ {
        self.levels.iter().copied()
    }

    /// Anzahl der eingeschalteten Kanäle
    pub fn on_count(&self) -> usize {
        self.levels.iter().filter(|level| level.is_on()).count()
    }

    /// Bitmaske der eingeschalteten Kanäle (Kanal 0 = LSB)
    pub fn on_mask(&self) -> u32 {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, level)| level.is_on())
            .fold(0, |mask, (i, _)| mask | (1 << i))
    }
}

/// Die drei Muster in fester Rotationsreihenfolge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    KnightRider,
    BinaryCounter,
    RandomBlink,
}

impl PatternKind {
    /// Rotationsreihenfolge, Index = Position in der Rotation
    pub const ROTATION: [PatternKind; 3] = [
        PatternKind::KnightRider,
        PatternKind::BinaryCounter,
        PatternKind::RandomBlink,
    ];

    pub const fn index(self) -> usize {
        match self {
            PatternKind::KnightRider => 0,
            PatternKind::BinaryCounter => 1,
            PatternKind::RandomBlink => 2,
        }
    }

    /// Nächstes Muster: `(index + 1) mod 3`
    pub const fn next(self) -> Self {
        Self::ROTATION[(self.index() + 1) % Self::ROTATION.len()]
    }

    pub const fn name(self) -> &'static str {
        match self {
            PatternKind::KnightRider => "Knight Rider",
            PatternKind::BinaryCounter => "Binary Counter",
            PatternKind::RandomBlink => "Random Blinking",
        }
    }
}

/// Laufrichtung des Knight-Rider-Lichts (+1 / -1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub const fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Zustand des aktiven Musters
///
/// Jede Variante trägt nur ihren eigenen Schritt-Zustand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternState {
    KnightRider { position: usize, direction: Direction },
    BinaryCounter { counter: u32 },
    RandomBlink,
}

impl PatternState {
    /// Startzustand eines Musters
    pub const fn initial(kind: PatternKind) -> Self {
        match kind {
            PatternKind::KnightRider => PatternState::KnightRider {
                position: 0,
                direction: Direction::Forward,
            },
            PatternKind::BinaryCounter => PatternState::BinaryCounter { counter: 0 },
            PatternKind::RandomBlink => PatternState::RandomBlink,
        }
    }

    pub const fn kind(&self) -> PatternKind {
        match self {
            PatternState::KnightRider { .. } => PatternKind::KnightRider,
            PatternState::BinaryCounter { .. } => PatternKind::BinaryCounter,
            PatternState::RandomBlink => PatternKind::RandomBlink,
        }
    }
}

/// Ergebnis eines angewendeten Schritts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub pattern: PatternKind,
    pub frame: Frame,
    /// Bitmaske der Kanäle, die ein Kommando bekommen haben
    pub changed: u32,
    /// Bitmaske der Kanäle, deren Kommando fehlgeschlagen ist
    pub failed: u32,
}

/// Status-Snapshot für Channel-Kommunikation
///
/// Wird vom Cycler-Task an den Log-Task veröffentlicht.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclerStatus {
    pub pattern: PatternKind,
    pub frame: Frame,
    pub switched: bool,
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for Intensity {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}%", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Frame {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "[");
        for (i, level) in self.levels.iter().enumerate() {
            if i > 0 {
                defmt::write!(fmt, ", ");
            }
            defmt::write!(fmt, "{}", level.0);
        }
        defmt::write!(fmt, "]")
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PatternKind {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CyclerStatus {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "CyclerStatus {{ mode: {} ({}), frame: {}, switched: {} }}",
            self.pattern.index(),
            self.pattern,
            self.frame,
            self.switched
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_clamps_to_full() {
        assert_eq!(Intensity::from_percent(250), Intensity::FULL);
        assert_eq!(Intensity::from_percent(40).percent(), 40);
        assert!(!Intensity::OFF.is_on());
    }

    #[test]
    fn test_frame_from_bits_lsb_first() {
        let frame = Frame::from_bits(3, 0b110);
        assert_eq!(frame.get(0), Some(Intensity::OFF));
        assert_eq!(frame.get(1), Some(Intensity::FULL));
        assert_eq!(frame.get(2), Some(Intensity::FULL));
        assert_eq!(frame.on_mask(), 0b110);
    }

    #[test]
    fn test_frame_is_bounded() {
        let frame = Frame::off(MAX_CHANNELS + 4);
        assert_eq!(frame.len(), MAX_CHANNELS);
    }

    #[test]
    fn test_pattern_kind_rotation_wraps() {
        assert_eq!(PatternKind::KnightRider.next(), PatternKind::BinaryCounter);
        assert_eq!(PatternKind::BinaryCounter.next(), PatternKind::RandomBlink);
        assert_eq!(PatternKind::RandomBlink.next(), PatternKind::KnightRider);
    }
}
