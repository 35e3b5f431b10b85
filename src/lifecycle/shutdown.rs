//! Shutdown coordination.

use tokio::sync::broadcast;

/// Broadcasts a single shutdown notification to every subscriber.
///
/// Cloning shares the underlying channel, so a clone can be moved into the
/// signal task while the original hands out receivers.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify subscribers. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        let listeners = self.tx.send(()).unwrap_or(0);
        tracing::info!(listeners, "Shutdown triggered");
        listeners
    }

    /// Receivers that have not been dropped yet.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.clone().subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        assert_eq!(shutdown.trigger(), 2);
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers() {
        assert_eq!(Shutdown::new().trigger(), 0);
    }
}
