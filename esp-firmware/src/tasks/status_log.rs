// Status Log Task - Diagnose-Senke für Cycler-Snapshots
//
// Rein beobachtend: liest nur, beeinflusst den Cycler nie.
use defmt::info;

use crate::StatusSubscriber;

/// Status Log Task
///
/// Wartet auf Status-Snapshots und loggt jeden Frame.
/// Verpasste Snapshots (Log-Task zu langsam) werden übersprungen.
#[embassy_executor::task]
pub async fn status_log_task(mut status_subscriber: StatusSubscriber) {
    loop {
        let status = status_subscriber.next_message_pure().await;
        info!("Status: {}", status);
    }
}
