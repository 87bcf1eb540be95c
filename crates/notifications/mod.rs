pub mod payment_dispatcher;
pub mod queue;
