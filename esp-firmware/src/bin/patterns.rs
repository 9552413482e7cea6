// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Muster-Demo auf GPIO: Knight Rider → Binary Counter → Random Blinking,
// Wechsel alle 10 Sekunden, Schritt alle 300 ms

use defmt::info;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

use esp_led_muster::StatusChannel;
use esp_led_muster::config::LED_GPIO_PINS;
use esp_led_muster::hal::GpioChannelDriver;
use esp_led_muster::tasks::{gpio_pattern_task, status_log_task};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    info!("ESP32 LED Pattern Demo Started");
    info!(
        "Initializing LEDs on GPIO {}, {}, {}",
        LED_GPIO_PINS[0], LED_GPIO_PINS[1], LED_GPIO_PINS[2]
    );

    let leds = [
        Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO4, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO5, Level::Low, OutputConfig::default()),
    ];
    let driver = GpioChannelDriver::new(leds).expect("Failed to configure LED GPIOs");

    // Status-Channel: Cycler-Task → Log-Task
    static STATUS_CHANNEL: StaticCell<StatusChannel> = StaticCell::new();
    let status_channel = &*STATUS_CHANNEL.init(StatusChannel::new());
    let status_publisher = status_channel.publisher().unwrap();
    let status_subscriber = status_channel.subscriber().unwrap();

    spawner
        .spawn(gpio_pattern_task(driver, status_publisher))
        .unwrap();
    spawner.spawn(status_log_task(status_subscriber)).unwrap();

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
