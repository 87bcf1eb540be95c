pub mod sms_gateway;
