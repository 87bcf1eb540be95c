pub mod alif_callback;
pub mod enums;
pub mod order_snapshot;
pub mod payment_notifications;
