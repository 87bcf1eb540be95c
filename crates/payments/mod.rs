pub mod alif_client;
pub mod signature;
