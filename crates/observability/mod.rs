mod config;
mod discord;
mod layer;

use crate::notifications::queue::{DeliveryProvider, DeliveryQueue};
use anyhow::Result;
use config::ObservabilityConfig;
use discord::DiscordAlertProvider;
use layer::{AlertEvent, AlertLayer};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use config::parse_bool;

const ALERT_QUEUE_CAPACITY: usize = 256;

/// Installs the global subscriber: RUST_LOG filtering (default `info`), local-time fmt
/// output, and the optional Discord alert sink. Must run inside the tokio runtime.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);
    let mut warnings = config.warnings.clone();

    let alert_layer = match config.alerts.as_ref() {
        Some(alerts) => match DiscordAlertProvider::new(alerts.discord_webhook_url.clone()) {
            Ok(provider) => {
                let providers: Vec<Arc<dyn DeliveryProvider<AlertEvent>>> =
                    vec![Arc::new(provider)];
                let queue = DeliveryQueue::spawn("alerts", ALERT_QUEUE_CAPACITY, providers);
                Some(AlertLayer::new(
                    queue,
                    config.service_context.clone(),
                    alerts.min_level,
                ))
            }
            Err(err) => {
                warnings.push(format!("discord alerts disabled: {err}"));
                None
            }
        },
        None => None,
    };
    let alerts_enabled = alert_layer.is_some();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(alert_layer)
        .try_init()?;

    let ctx = &config.service_context;
    for warning in &warnings {
        warn!(
            service = %ctx.service_name,
            environment = %ctx.environment,
            component = %ctx.component,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %ctx.service_name,
        environment = %ctx.environment,
        component = %ctx.component,
        alerts_enabled,
        "observability: tracing initialised"
    );

    Ok(())
}
