use super::layer::AlertEvent;
use crate::notifications::queue::DeliveryProvider;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use url::Url;

const DISCORD_CONTENT_LIMIT: usize = 2000;

pub(crate) struct DiscordAlertProvider {
    webhook_url: Url,
    client: Client,
}

impl DiscordAlertProvider {
    pub(crate) fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()
            .context("failed to build discord http client")?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl DeliveryProvider<AlertEvent> for DiscordAlertProvider {
    async fn deliver(&self, event: &AlertEvent) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": format_alert(event) }))
            .send()
            .await
            // reqwest errors embed the URL, which carries the webhook secret.
            .map_err(|err| {
                if err.is_timeout() {
                    anyhow!("discord webhook request timed out")
                } else {
                    anyhow!("discord webhook request failed")
                }
            })?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "discord webhook returned non-success status: {}",
                response.status()
            ));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "discord"
    }
}

pub(crate) fn format_alert(event: &AlertEvent) -> String {
    let mut lines = vec![format!(
        "**{}** `{}` `{}` `{}`",
        event.service_name, event.environment, event.component, event.level
    )];

    let location = event
        .location
        .as_deref()
        .map(|loc| format!(" `{loc}`"))
        .unwrap_or_default();
    lines.push(format!(
        "`{}` `{}`{}",
        event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        event.target,
        location
    ));

    if let Some(message) = event.message.as_deref().filter(|m| !m.trim().is_empty()) {
        lines.push(format!("> {}", message.trim()));
    }
    if !event.spans.is_empty() {
        lines.push(format!("spans: `{}`", event.spans.join(" > ")));
    }
    for (key, value) in &event.fields {
        lines.push(format!("- `{key}` = `{value}`"));
    }

    truncate(lines.join("\n"))
}

fn truncate(content: String) -> String {
    const SUFFIX: &str = "\n… (truncated)";

    if content.chars().count() <= DISCORD_CONTENT_LIMIT {
        return content;
    }

    let allowed = DISCORD_CONTENT_LIMIT - SUFFIX.chars().count();
    let mut truncated: String = content.chars().take(allowed).collect();
    truncated.push_str(SUFFIX);
    truncated
}
