use sakina_core::infra::sms::sms_gateway::SmsGatewayConfig;

pub const ALIF_CALLBACK_PATH: &str = "/api/v1/payments/alif/callback";
pub const PAYMENT_SUCCESS_PATH: &str = "/payment/success";

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub alif: Alif,
    pub public_urls: PublicUrls,
    /// `None` when staff SMS is switched off.
    pub sms: Option<SmsGatewayConfig>,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Alif {
    pub merchant_id: String,
    pub secret_key: String,
    pub api_url: String,
    pub default_gate: String,
    /// Reject callbacks that carry no token instead of accepting them with a warning.
    pub require_callback_token: bool,
}

#[derive(Debug, Clone)]
pub struct PublicUrls {
    pub service_base_url: String,
    pub site_url: String,
}

impl PublicUrls {
    /// Where the gateway posts payment results. Signed into every token.
    pub fn alif_callback_url(&self) -> String {
        format!(
            "{}{}",
            self.service_base_url.trim_end_matches('/'),
            ALIF_CALLBACK_PATH
        )
    }

    pub fn payment_return_url(&self, order_id: &str) -> String {
        format!(
            "{}{}?order_id={}",
            self.site_url.trim_end_matches('/'),
            PAYMENT_SUCCESS_PATH,
            order_id
        )
    }
}
