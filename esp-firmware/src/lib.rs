// Library-Root: Wiederverwendbare Logik und Module
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod tasks;

// Status-Snapshot aus esp-core
use esp_core::CyclerStatus;

// Embassy Channel-Typen
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

use crate::config::STATUS_CHANNEL_CAPACITY;

// ============================================================================
// Type-Aliase für Channel-Typen
// ============================================================================
//
// Statt:  Publisher<'static, NoopRawMutex, CyclerStatus, 4, 1, 1>
// Nutze:  StatusPublisher

/// PubSubChannel für Cycler-Status-Snapshots
/// - STATUS_CHANNEL_CAPACITY: Nachrichten-Kapazität im Queue
/// - 1: Maximale Anzahl Subscribers (Log-Task)
/// - 1: Maximale Anzahl Publishers (Cycler-Task)
pub type StatusChannel = PubSubChannel<NoopRawMutex, CyclerStatus, STATUS_CHANNEL_CAPACITY, 1, 1>;

/// Publisher für Status-Snapshots (Cycler-Task)
pub type StatusPublisher =
    Publisher<'static, NoopRawMutex, CyclerStatus, STATUS_CHANNEL_CAPACITY, 1, 1>;

/// Subscriber für Status-Snapshots (Log-Task)
pub type StatusSubscriber =
    Subscriber<'static, NoopRawMutex, CyclerStatus, STATUS_CHANNEL_CAPACITY, 1, 1>;
