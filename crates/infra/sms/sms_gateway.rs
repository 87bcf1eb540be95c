use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        enums::notification_checkpoints::NotificationCheckpoint,
        payment_notifications::PaymentNotification,
    },
    notifications::queue::DeliveryProvider,
    payments::signature::format_amount,
};

#[derive(Debug, Clone)]
pub struct SmsGatewayConfig {
    pub api_url: Url,
    pub login: String,
    pub token: String,
    pub sender: String,
    pub staff_phones: Vec<String>,
}

/// HTTP SMS gateway (OsonSMS-compatible `GET` send endpoint with bearer auth).
pub struct SmsGatewayProvider {
    client: reqwest::Client,
    config: SmsGatewayConfig,
}

impl SmsGatewayProvider {
    pub fn new(config: SmsGatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("failed to build sms http client")?;

        Ok(Self { client, config })
    }

    async fn send_one(&self, phone: &str, message: &str) -> Result<()> {
        let txn_id = Uuid::new_v4().simple().to_string();
        let response = self
            .client
            .get(self.config.api_url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.config.token))
            .query(&[
                ("from", self.config.sender.as_str()),
                ("phone_number", phone),
                ("msg", message),
                ("login", self.config.login.as_str()),
                ("txn_id", txn_id.as_str()),
            ])
            .send()
            .await
            .context("sms gateway request failed")?;

        if !response.status().is_success() {
            bail!("sms gateway returned non-success status: {}", response.status());
        }

        Ok(())
    }
}

#[async_trait]
impl DeliveryProvider<PaymentNotification> for SmsGatewayProvider {
    async fn deliver(&self, event: &PaymentNotification) -> Result<()> {
        let message = format_payment_sms(event);
        let mut failed = 0usize;

        for phone in &self.config.staff_phones {
            if let Err(err) = self.send_one(phone, &message).await {
                failed += 1;
                warn!(
                    payment_id = %event.payment_id,
                    checkpoint = %event.checkpoint,
                    error = %err,
                    "sms_gateway: staff sms not delivered"
                );
            }
        }

        if failed > 0 {
            bail!(
                "{failed} of {} staff sms deliveries failed",
                self.config.staff_phones.len()
            );
        }

        info!(
            payment_id = %event.payment_id,
            checkpoint = %event.checkpoint,
            recipients = self.config.staff_phones.len(),
            "sms_gateway: staff notified"
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "sms_gateway"
    }
}

pub fn format_payment_sms(event: &PaymentNotification) -> String {
    let headline = match event.checkpoint {
        NotificationCheckpoint::Pending => "Новый заказ ожидает оплаты",
        NotificationCheckpoint::Confirmed => "Заказ оплачен",
    };

    let mut lines = vec![
        headline.to_string(),
        format!("№ {}", event.alif_order_id),
        format!("Сумма: {} {}", format_amount(event.amount), event.currency),
        format!("Клиент: {} {}", event.customer_name, event.customer_phone),
    ];
    if let Some(delivery) = event.delivery_type.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("Доставка: {delivery}"));
    }

    lines.join("\n")
}
