//! Read-only observation of service lifecycle transitions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::lifecycle::{Operation, State};

const CHANNEL_CAPACITY: usize = 64;

/// A lifecycle operation that completed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEvent {
    /// Service name.
    pub service: String,
    /// Operation that completed.
    pub operation: Operation,
    /// Controller state after the operation, `None` without a controller.
    pub state: Option<State>,
    /// Per-service sequence number, starting at 1.
    pub sequence: u64,
}

/// Publishing side, owned by the service.
#[derive(Debug)]
pub(crate) struct ServiceStateNotifier {
    service: String,
    tx: broadcast::Sender<ServiceEvent>,
    sequence: AtomicU64,
}

impl ServiceStateNotifier {
    pub(crate) fn new(service: &str) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            service: service.to_string(),
            tx,
            sequence: AtomicU64::new(0),
        }
    }

    pub(crate) fn publish(&self, operation: Operation, state: Option<State>) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        // No subscribers is not an error.
        let _ = self.tx.send(ServiceEvent {
            service: self.service.clone(),
            operation,
            state,
            sequence,
        });
    }

    pub(crate) fn subscribe(&self) -> ServiceStateSubscription {
        ServiceStateSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub(crate) fn notifications(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

/// Subscription to a service's transitions.
///
/// Observers can follow the lifecycle but hold no way to trigger it.
/// A subscriber that falls more than 64 events behind skips the oldest.
#[derive(Debug)]
pub struct ServiceStateSubscription {
    rx: broadcast::Receiver<ServiceEvent>,
}

impl ServiceStateSubscription {
    /// Wait for the next event. `None` once the service is gone.
    pub async fn recv(&mut self) -> Option<ServiceEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Service state observer lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Blocking variant of [`ServiceStateSubscription::recv`].
    ///
    /// Must not be called from within an async context.
    pub fn blocking_recv(&mut self) -> Option<ServiceEvent> {
        loop {
            match self.rx.blocking_recv() {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next pending event, without waiting.
    pub fn try_recv(&mut self) -> Option<ServiceEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Every pending event.
    pub fn drain(&mut self) -> Vec<ServiceEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_and_drain() {
        let notifier = ServiceStateNotifier::new("svc");
        notifier.publish(Operation::Start, None);
        let mut sub = notifier.subscribe();
        notifier.publish(Operation::Stop, Some(State::Stopped));
        notifier.publish(Operation::Start, Some(State::Running));

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 2);
        assert_eq!(events[1].state, Some(State::Running));
        assert_eq!(notifier.notifications(), 3);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_lagging_subscriber_skips_oldest() {
        let notifier = ServiceStateNotifier::new("svc");
        let mut sub = notifier.subscribe();
        for _ in 0..(CHANNEL_CAPACITY + 10) {
            notifier.publish(Operation::Start, None);
        }
        let events = sub.drain();
        assert_eq!(events.len(), CHANNEL_CAPACITY);
        assert_eq!(events[0].sequence, 11);
    }

    #[tokio::test]
    async fn test_recv_closed() {
        let notifier = ServiceStateNotifier::new("svc");
        let mut sub = notifier.subscribe();
        notifier.publish(Operation::Setup, None);
        drop(notifier);
        assert_eq!(sub.recv().await.map(|e| e.operation), Some(Operation::Setup));
        assert!(sub.recv().await.is_none());
    }
}
