//! Best-effort rider notifications. Enqueueing never blocks the caller and a
//! message that does not fit is dropped; nothing is retried.

use async_channel::{Receiver, Sender, TrySendError};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::entities::{Ride, RideId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub rider_id: Uuid,
    pub ride_id: RideId,
    pub driver_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    sender: Sender<Notification>,
}

impl Notifier {
    pub fn channel(capacity: usize) -> (Self, Receiver<Notification>) {
        let (sender, receiver) = async_channel::bounded(capacity.max(1));

        (Self { sender }, receiver)
    }

    /// Queues a "ride accepted" message for the rider. Returns whether it was
    /// queued.
    pub fn ride_accepted(&self, ride: &Ride) -> bool {
        let driver_id = match ride.driver_id {
            Some(driver_id) => driver_id,
            None => return false,
        };

        let notification = Notification {
            rider_id: ride.rider_id,
            ride_id: ride.id,
            driver_id,
        };

        match self.sender.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(n)) => {
                tracing::warn!(ride_id = n.ride_id, "notification queue full, dropping");
                false
            }
            Err(TrySendError::Closed(n)) => {
                tracing::warn!(ride_id = n.ride_id, "notification worker gone, dropping");
                false
            }
        }
    }
}

/// Drains the queue until every [`Notifier`] is dropped.
pub fn spawn_worker(receiver: Receiver<Notification>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(notification) = receiver.recv().await {
            deliver(&notification);
        }

        tracing::debug!("notification worker stopped");
    })
}

// Delivery is a log line until a real channel (push, SMS) is wired in.
fn deliver(notification: &Notification) {
    tracing::info!(
        rider_id = %notification.rider_id,
        ride_id = notification.ride_id,
        driver_id = %notification.driver_id,
        "rider notified: ride accepted"
    );
}
