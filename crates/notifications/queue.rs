use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A sink that receives events drained from a [`DeliveryQueue`].
#[async_trait]
pub trait DeliveryProvider<E>: Send + Sync
where
    E: Send + Sync,
{
    async fn deliver(&self, event: &E) -> Result<()>;
    fn provider_name(&self) -> &'static str;
}

/// Bounded fire-and-forget queue.
///
/// Producers never wait: when the buffer is full the event is dropped with a warning.
/// Each event is handed to every provider exactly once; failures are logged, not retried.
pub struct DeliveryQueue<E> {
    name: &'static str,
    tx: mpsc::Sender<E>,
}

impl<E> Clone for DeliveryQueue<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<E> DeliveryQueue<E>
where
    E: Send + Sync + 'static,
{
    /// Starts the drain task. Must be called from within a tokio runtime.
    pub fn spawn(
        name: &'static str,
        capacity: usize,
        providers: Vec<Arc<dyn DeliveryProvider<E>>>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<E>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for provider in &providers {
                    match provider.deliver(&event).await {
                        Ok(()) => debug!(
                            queue = name,
                            provider = provider.provider_name(),
                            "delivery_queue: event delivered"
                        ),
                        Err(error) => warn!(
                            queue = name,
                            provider = provider.provider_name(),
                            error = %error,
                            "delivery_queue: provider failed"
                        ),
                    }
                }
            }
        });

        Self { name, tx }
    }

    /// Returns `false` when the event was dropped.
    pub fn try_enqueue(&self, event: E) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(queue = self.name, "delivery_queue: queue full; dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(queue = self.name, "delivery_queue: queue closed; dropping event");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use tokio::sync::{Notify, oneshot};

    struct Recording {
        seen: Arc<Mutex<Vec<u32>>>,
        done: Mutex<Option<oneshot::Sender<()>>>,
        expected: usize,
    }

    #[async_trait]
    impl DeliveryProvider<u32> for Recording {
        async fn deliver(&self, event: &u32) -> Result<()> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(*event);
            if seen.len() == self.expected {
                if let Some(done) = self.done.lock().unwrap().take() {
                    let _ = done.send(());
                }
            }
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    struct Failing;

    #[async_trait]
    impl DeliveryProvider<u32> for Failing {
        async fn deliver(&self, _event: &u32) -> Result<()> {
            Err(anyhow!("boom"))
        }

        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn delivers_to_every_provider_even_after_a_failure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = oneshot::channel();
        let recording = Arc::new(Recording {
            seen: Arc::clone(&seen),
            done: Mutex::new(Some(done_tx)),
            expected: 2,
        });

        let providers: Vec<Arc<dyn DeliveryProvider<u32>>> = vec![Arc::new(Failing), recording];
        let queue = DeliveryQueue::spawn("test", 8, providers);

        assert!(queue.try_enqueue(1));
        assert!(queue.try_enqueue(2));
        done_rx.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    struct Blocking {
        started: Mutex<Option<oneshot::Sender<()>>>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl DeliveryProvider<u32> for Blocking {
        async fn deliver(&self, _event: &u32) -> Result<()> {
            if let Some(started) = self.started.lock().unwrap().take() {
                let _ = started.send(());
            }
            self.release.notified().await;
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "blocking"
        }
    }

    #[tokio::test]
    async fn drops_events_when_the_buffer_is_full() {
        let (started_tx, started_rx) = oneshot::channel();
        let release = Arc::new(Notify::new());
        let provider = Arc::new(Blocking {
            started: Mutex::new(Some(started_tx)),
            release: Arc::clone(&release),
        });

        let providers: Vec<Arc<dyn DeliveryProvider<u32>>> = vec![provider];
        let queue = DeliveryQueue::spawn("test", 1, providers);

        assert!(queue.try_enqueue(1));
        started_rx.await.unwrap();
        assert!(queue.try_enqueue(2));
        assert!(!queue.try_enqueue(3));

        release.notify_waiters();
    }
}
