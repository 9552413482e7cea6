// Startwert für die Zufallsquelle des RandomBlink-Musters

use embassy_time::Instant;
use esp_hal::rng::Rng;

/// Zeitabhängiger Seed, einmal beim Start gezogen
///
/// Systemzeit seit Boot gemischt mit dem Hardware-RNG, damit sich
/// Läufe unterscheiden obwohl der Boot immer gleich lang dauert.
pub fn startup_seed() -> u32 {
    let ticks = Instant::now().as_ticks();
    let rng = Rng::new();
    (ticks as u32) ^ ((ticks >> 32) as u32) ^ rng.random()
}
