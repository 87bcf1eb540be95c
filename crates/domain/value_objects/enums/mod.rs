pub mod notification_checkpoints;
pub mod payment_statuses;
