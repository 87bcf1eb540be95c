pub mod payment_callback;
pub mod payment_errors;
pub mod payment_initiation;
pub mod payment_status;
