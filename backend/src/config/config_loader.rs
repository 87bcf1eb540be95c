use anyhow::{Context, Result, anyhow};
use sakina_core::{infra::sms::sms_gateway::SmsGatewayConfig, observability::parse_bool};
use url::Url;

use super::config_model::{Alif, BackendServer, Database, DotEnvyConfig, PublicUrls};

const DEFAULT_ALIF_GATE: &str = "vsa";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let alif = Alif {
        merchant_id: required("ALIF_MERCHANT_ID")?,
        secret_key: required("ALIF_SECRET_KEY")?,
        api_url: required("ALIF_API_URL")?,
        default_gate: optional("ALIF_DEFAULT_GATE")
            .unwrap_or_else(|| DEFAULT_ALIF_GATE.to_string()),
        require_callback_token: flag("ALIF_REQUIRE_CALLBACK_TOKEN", false)?,
    };

    let public_urls = PublicUrls {
        service_base_url: required("SERVICE_BASE_URL")?,
        site_url: required("SITE_URL")?,
    };

    let sms = if flag("SMS_ENABLED", false)? {
        Some(SmsGatewayConfig {
            api_url: Url::parse(&required("SMS_API_URL")?).context("SMS_API_URL is invalid")?,
            login: required("SMS_LOGIN")?,
            token: required("SMS_TOKEN")?,
            sender: required("SMS_SENDER")?,
            staff_phones: split_list(&required("SMS_STAFF_PHONES")?),
        })
    } else {
        None
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        alif,
        public_urls,
        sms,
    })
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| anyhow!("{key} is missing"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn flag(key: &str, default: bool) -> Result<bool> {
    match optional(key) {
        Some(raw) => parse_bool(&raw).ok_or_else(|| anyhow!("{key} is invalid: {raw}")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
