// Hardware Abstraction Layer (HAL) Module
//
// Dieses Modul kapselt Hardware-Zugriffe hinter dem ChannelDriver-Trait
// aus esp-core, um die Muster-Logik testbar zu halten.

pub mod gpio_driver;
pub mod ledc_driver;
pub mod random;

pub use gpio_driver::GpioChannelDriver;
pub use ledc_driver::LedcChannelDriver;
pub use random::startup_seed;
