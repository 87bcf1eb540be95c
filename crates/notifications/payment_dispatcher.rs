use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{
    repositories::notifications::PaymentNotifier,
    value_objects::payment_notifications::PaymentNotification,
};

use super::queue::{DeliveryProvider, DeliveryQueue};

const PAYMENT_QUEUE_CAPACITY: usize = 128;

/// Enqueues staff notifications without ever waiting on the SMS provider.
pub struct PaymentNotificationDispatcher {
    queue: Option<DeliveryQueue<PaymentNotification>>,
}

impl PaymentNotificationDispatcher {
    pub fn spawn(providers: Vec<Arc<dyn DeliveryProvider<PaymentNotification>>>) -> Self {
        if providers.is_empty() {
            info!("payment_notifications: no providers configured; notifications disabled");
            return Self::disabled();
        }

        Self {
            queue: Some(DeliveryQueue::spawn(
                "payment_notifications",
                PAYMENT_QUEUE_CAPACITY,
                providers,
            )),
        }
    }

    pub fn disabled() -> Self {
        Self { queue: None }
    }
}

impl PaymentNotifier for PaymentNotificationDispatcher {
    fn notify(&self, notification: PaymentNotification) {
        let Some(queue) = self.queue.as_ref() else {
            debug!(
                payment_id = %notification.payment_id,
                checkpoint = %notification.checkpoint,
                "payment_notifications: disabled, skipping"
            );
            return;
        };

        let payment_id = notification.payment_id;
        let checkpoint = notification.checkpoint;
        if queue.try_enqueue(notification) {
            debug!(%payment_id, %checkpoint, "payment_notifications: enqueued");
        }
    }
}
