use mockall::automock;

use crate::domain::value_objects::payment_notifications::PaymentNotification;

/// Best-effort staff notifications. Implementations must not block or fail the caller.
#[automock]
pub trait PaymentNotifier {
    fn notify(&self, notification: PaymentNotification);
}
