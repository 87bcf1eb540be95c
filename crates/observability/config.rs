use std::env;
use tracing::Level;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone)]
pub(crate) struct AlertSinkConfig {
    pub(crate) discord_webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) alerts: Option<AlertSinkConfig>,
    /// Problems found while parsing, logged once tracing is up.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();
        let service_name = non_empty_env("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = non_empty_env("STAGE").unwrap_or_else(|| "unknown".to_string());

        let mut warnings = Vec::new();
        let alerts = alerts_from_env(&mut warnings);

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            alerts,
            warnings,
        }
    }
}

fn alerts_from_env(warnings: &mut Vec<String>) -> Option<AlertSinkConfig> {
    if !non_empty_env("ALERT_ENABLED")
        .and_then(|raw| parse_bool(&raw))
        .unwrap_or(true)
    {
        return None;
    }

    let raw_url = non_empty_env("ALERT_DISCORD_WEBHOOK_URL")?;
    let discord_webhook_url = match Url::parse(&raw_url) {
        Ok(url) => url,
        Err(err) => {
            // The URL embeds a secret, so only the parse error is reported.
            warnings.push(format!(
                "ALERT_DISCORD_WEBHOOK_URL is invalid; alerts disabled (parse error: {err})"
            ));
            return None;
        }
    };

    let min_level = match non_empty_env("ALERT_LEVEL") {
        Some(raw) => parse_level(&raw).unwrap_or_else(|| {
            warnings.push(format!("ALERT_LEVEL is invalid (value: {raw}); using ERROR"));
            Level::ERROR
        }),
        None => Level::ERROR,
    };

    Some(AlertSinkConfig {
        discord_webhook_url,
        min_level,
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn parse_level(input: &str) -> Option<Level> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
