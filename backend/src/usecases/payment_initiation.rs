use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sakina_core::{
    domain::{
        entities::payments::InsertPaymentEntity,
        repositories::{notifications::PaymentNotifier, payments::PaymentRepository},
        value_objects::{
            enums::{
                notification_checkpoints::NotificationCheckpoint, payment_statuses::PaymentStatus,
            },
            order_snapshot::OrderSnapshot,
            payment_notifications::PaymentNotification,
        },
    },
    payments::{
        alif_client::{
            AlifClient, AlifGatewayError, AlifInvoices, AlifPaymentCreated, AlifPaymentRequest,
        },
        signature::AlifSignature,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::config_model::{Alif, PublicUrls};

use super::payment_errors::{PaymentError, UseCaseResult};

pub const ALIF_ORDER_PREFIX: &str = "SAKINA";
pub const DEFAULT_CURRENCY: &str = "TJS";

const ORDER_SUFFIX_LEN: usize = 9;
const ORDER_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const DEFAULT_GATEWAY_MESSAGE: &str = "Payment created successfully";
/// Amounts are signed, sent and stored with at most this many decimal places.
const AMOUNT_MAX_SCALE: u32 = 2;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlifGateway: Send + Sync {
    async fn create_payment(
        &self,
        request: &AlifPaymentRequest,
    ) -> Result<AlifPaymentCreated, AlifGatewayError>;
}

#[async_trait]
impl AlifGateway for AlifClient {
    async fn create_payment(
        &self,
        request: &AlifPaymentRequest,
    ) -> Result<AlifPaymentCreated, AlifGatewayError> {
        self.create_payment(request).await
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    /// Payment channel; the configured default is used when absent.
    #[serde(default)]
    pub gate: Option<String>,
    pub order_data: OrderSnapshot,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentInitiated {
    pub payment_id: Uuid,
    pub order_id: String,
    pub payment_url: String,
    pub message: String,
}

/// Registers a payment with Alif and records it locally as pending.
pub struct PaymentInitiationUseCase<P, G, N>
where
    P: PaymentRepository + Send + Sync + 'static,
    G: AlifGateway + 'static,
    N: PaymentNotifier + Send + Sync + 'static,
{
    payment_repo: Arc<P>,
    gateway: Arc<G>,
    notifier: Arc<N>,
    signature: AlifSignature,
    default_gate: String,
    public_urls: PublicUrls,
}

impl<P, G, N> PaymentInitiationUseCase<P, G, N>
where
    P: PaymentRepository + Send + Sync + 'static,
    G: AlifGateway + 'static,
    N: PaymentNotifier + Send + Sync + 'static,
{
    pub fn new(
        payment_repo: Arc<P>,
        gateway: Arc<G>,
        notifier: Arc<N>,
        alif: &Alif,
        public_urls: PublicUrls,
    ) -> Self {
        Self {
            payment_repo,
            gateway,
            notifier,
            signature: AlifSignature::new(alif.merchant_id.clone(), alif.secret_key.clone()),
            default_gate: alif.default_gate.clone(),
            public_urls,
        }
    }

    pub async fn initiate(&self, request: InitiatePaymentRequest) -> UseCaseResult<PaymentInitiated> {
        let currency = normalize_currency(request.currency.as_deref())?;
        validate_order(request.amount, &request.order_data)?;

        let gate = request
            .gate
            .as_deref()
            .map(str::trim)
            .filter(|gate| !gate.is_empty())
            .unwrap_or(&self.default_gate)
            .to_string();
        let alif_order_id = generate_alif_order_id();
        let callback_url = self.public_urls.alif_callback_url();
        let return_url = self.public_urls.payment_return_url(&alif_order_id);

        let order_data = serde_json::to_value(&request.order_data)
            .context("failed to serialize order snapshot")?;
        let token = self
            .signature
            .request_token(&alif_order_id, request.amount, &callback_url)?;

        let customer = &request.order_data.customer_info;
        let delivery = &request.order_data.delivery_info;

        info!(
            %alif_order_id,
            amount = %request.amount,
            %currency,
            %gate,
            items = request.order_data.items.len(),
            "payments: initiating alif payment"
        );

        let gateway_request = AlifPaymentRequest {
            key: self.signature.merchant_id().to_string(),
            order_id: alif_order_id.clone(),
            amount: request.amount,
            callback_url,
            return_url,
            email: customer.email.trim().to_string(),
            phone: customer.phone.trim().to_string(),
            gate: gate.clone(),
            token,
            info: format!("Sakina order {alif_order_id}"),
            invoices: AlifInvoices::new(request.order_data.invoice_lines()),
        };

        let created = self
            .gateway
            .create_payment(&gateway_request)
            .await
            .map_err(|err| {
                warn!(
                    %alif_order_id,
                    error = %err,
                    "payments: alif refused to create payment"
                );
                PaymentError::from(err)
            })?;

        let record = InsertPaymentEntity {
            alif_order_id: alif_order_id.clone(),
            amount: request.amount,
            currency: currency.clone(),
            status: PaymentStatus::Pending.as_str().to_string(),
            order_data,
            customer_name: customer.name.trim().to_string(),
            customer_phone: customer.phone.trim().to_string(),
            customer_email: customer.email.trim().to_string(),
            delivery_type: delivery.type_.clone(),
            delivery_address: delivery.address.clone(),
            payment_gateway: gate,
        };

        let payment_id = self
            .payment_repo
            .insert_pending_payment(record.clone())
            .await
            .map_err(|err| {
                // The gateway now expects a callback for an order we have no record of.
                error!(
                    %alif_order_id,
                    amount = %request.amount,
                    db_error = ?err,
                    "payments: alif payment created but the pending record was not saved"
                );
                PaymentError::Persistence(err)
            })?;

        info!(%payment_id, %alif_order_id, "payments: pending payment recorded");

        self.notifier.notify(PaymentNotification {
            payment_id,
            checkpoint: NotificationCheckpoint::Pending,
            alif_order_id: alif_order_id.clone(),
            amount: record.amount,
            currency: record.currency,
            customer_name: record.customer_name,
            customer_phone: record.customer_phone,
            delivery_type: record.delivery_type,
        });

        Ok(PaymentInitiated {
            payment_id,
            order_id: alif_order_id,
            payment_url: created.payment_url,
            message: created
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GATEWAY_MESSAGE.to_string()),
        })
    }
}

/// `SAKINA_<unix millis>_<9 lowercase alphanumerics>`.
pub fn generate_alif_order_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_SUFFIX_LEN)
        .map(|_| ORDER_SUFFIX_CHARSET[rng.gen_range(0..ORDER_SUFFIX_CHARSET.len())] as char)
        .collect();

    format!(
        "{ALIF_ORDER_PREFIX}_{}_{suffix}",
        Utc::now().timestamp_millis()
    )
}

fn normalize_currency(raw: Option<&str>) -> UseCaseResult<String> {
    let currency = raw
        .map(str::trim)
        .filter(|currency| !currency.is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_ascii_uppercase();

    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PaymentError::Validation(format!(
            "currency must be a 3-letter code, got {currency:?}"
        )));
    }

    Ok(currency)
}

fn validate_order(amount: Decimal, order: &OrderSnapshot) -> UseCaseResult<()> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }

    if amount.normalize().scale() > AMOUNT_MAX_SCALE {
        return Err(PaymentError::Validation(format!(
            "amount must have at most {AMOUNT_MAX_SCALE} decimal places"
        )));
    }

    let missing = order.missing_customer_fields();
    if !missing.is_empty() {
        return Err(PaymentError::Validation(format!(
            "missing required customer fields: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use sakina_core::domain::repositories::{
        notifications::MockPaymentNotifier, payments::MockPaymentRepository,
    };
    use serde_json::json;

    const MERCHANT_ID: &str = "656374";
    const SECRET: &str = "QipCWXJGf39yJA77W5np";

    fn alif_config() -> Alif {
        Alif {
            merchant_id: MERCHANT_ID.to_string(),
            secret_key: SECRET.to_string(),
            api_url: "https://test-web.alif.tj".to_string(),
            default_gate: "vsa".to_string(),
            require_callback_token: false,
        }
    }

    fn public_urls() -> PublicUrls {
        PublicUrls {
            service_base_url: "https://api.sakina.tj".to_string(),
            site_url: "https://sakina.tj".to_string(),
        }
    }

    fn mattress_request() -> InitiatePaymentRequest {
        serde_json::from_value(json!({
            "amount": 1000,
            "currency": "TJS",
            "orderData": {
                "items": [{"id": "1", "name": "Mattress", "price": 1000, "quantity": 1}],
                "customerInfo": {"name": "Ali", "email": "a@b.com", "phone": "+992901234567"},
                "deliveryInfo": {"type": "home"}
            }
        }))
        .unwrap()
    }

    fn usecase(
        payment_repo: MockPaymentRepository,
        gateway: MockAlifGateway,
        notifier: MockPaymentNotifier,
    ) -> PaymentInitiationUseCase<MockPaymentRepository, MockAlifGateway, MockPaymentNotifier> {
        PaymentInitiationUseCase::new(
            Arc::new(payment_repo),
            Arc::new(gateway),
            Arc::new(notifier),
            &alif_config(),
            public_urls(),
        )
    }

    fn created() -> AlifPaymentCreated {
        AlifPaymentCreated {
            payment_url: "https://pay.alif.tj/checkout/abc".to_string(),
            message: None,
        }
    }

    fn assert_order_id_format(order_id: &str) {
        let parts: Vec<&str> = order_id.split('_').collect();
        assert_eq!(parts.len(), 3, "unexpected order id {order_id}");
        assert_eq!(parts[0], "SAKINA");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 9);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn generated_order_ids_match_format_and_do_not_repeat() {
        let first = generate_alif_order_id();
        let second = generate_alif_order_id();

        assert_order_id_format(&first);
        assert_order_id_format(&second);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn missing_customer_fields_fail_without_calling_the_gateway() {
        let mut payment_repo = MockPaymentRepository::new();
        let mut gateway = MockAlifGateway::new();
        let mut notifier = MockPaymentNotifier::new();

        gateway.expect_create_payment().times(0);
        payment_repo.expect_insert_pending_payment().times(0);
        notifier.expect_notify().times(0);

        let mut request = mattress_request();
        request.order_data.customer_info.email.clear();
        request.order_data.customer_info.phone = "   ".to_string();

        let err = usecase(payment_repo, gateway, notifier)
            .initiate(request)
            .await
            .unwrap_err();

        match err {
            PaymentError::Validation(message) => {
                assert!(message.contains("email"));
                assert!(message.contains("phone"));
                assert!(!message.contains("name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_positive_amount_or_bad_currency_is_rejected() {
        let mut gateway = MockAlifGateway::new();
        gateway.expect_create_payment().times(0);
        let usecase = usecase(MockPaymentRepository::new(), gateway, MockPaymentNotifier::new());

        let mut zero = mattress_request();
        zero.amount = Decimal::ZERO;
        assert!(matches!(
            usecase.initiate(zero).await,
            Err(PaymentError::Validation(_))
        ));

        let mut bad_currency = mattress_request();
        bad_currency.currency = Some("TJS1".to_string());
        assert!(matches!(
            usecase.initiate(bad_currency).await,
            Err(PaymentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn sub_cent_amounts_are_rejected_before_signing() {
        let mut gateway = MockAlifGateway::new();
        gateway.expect_create_payment().times(0);
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo.expect_insert_pending_payment().times(0);
        let usecase = usecase(payment_repo, gateway, MockPaymentNotifier::new());

        let mut request = mattress_request();
        request.amount = Decimal::new(10005, 3);

        match usecase.initiate(request).await {
            Err(PaymentError::Validation(message)) => {
                assert!(message.contains("decimal places"))
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let order = mattress_request().order_data;
        assert!(validate_order(Decimal::new(1050, 2), &order).is_ok());
        assert!(validate_order(Decimal::new(1000000, 3), &order).is_ok());
    }

    #[tokio::test]
    async fn creates_gateway_payment_and_records_it_as_pending() {
        let payment_id = Uuid::new_v4();
        let mut payment_repo = MockPaymentRepository::new();
        let mut gateway = MockAlifGateway::new();
        let mut notifier = MockPaymentNotifier::new();

        gateway
            .expect_create_payment()
            .withf(|request: &AlifPaymentRequest| {
                let expected_token = AlifSignature::new(MERCHANT_ID.into(), SECRET.into())
                    .request_token(&request.order_id, request.amount, &request.callback_url)
                    .unwrap();

                request.key == MERCHANT_ID
                    && request.gate == "vsa"
                    && request.token == expected_token
                    && request.amount == Decimal::from(1000)
                    && request.callback_url
                        == "https://api.sakina.tj/api/v1/payments/alif/callback"
                    && request.return_url
                        == format!(
                            "https://sakina.tj/payment/success?order_id={}",
                            request.order_id
                        )
                    && request.email == "a@b.com"
                    && request.invoices.invoices.len() == 1
                    && request.invoices.invoices[0].name == "Mattress"
                    && request.invoices.invoices[0].category == "products"
            })
            .times(1)
            .returning(|_| Ok(created()));

        payment_repo
            .expect_insert_pending_payment()
            .withf(|record: &InsertPaymentEntity| {
                record.status == "pending"
                    && record.amount == Decimal::from(1000)
                    && record.currency == "TJS"
                    && record.payment_gateway == "vsa"
                    && record.customer_name == "Ali"
                    && record.delivery_type.as_deref() == Some("home")
                    && record.order_data["items"][0]["name"] == "Mattress"
                    && record.alif_order_id.starts_with("SAKINA_")
            })
            .times(1)
            .returning(move |_| Ok(payment_id));

        notifier
            .expect_notify()
            .withf(move |notification: &PaymentNotification| {
                notification.payment_id == payment_id
                    && notification.checkpoint == NotificationCheckpoint::Pending
            })
            .times(1)
            .return_const(());

        let initiated = usecase(payment_repo, gateway, notifier)
            .initiate(mattress_request())
            .await
            .unwrap();

        assert_eq!(initiated.payment_id, payment_id);
        assert_eq!(initiated.payment_url, "https://pay.alif.tj/checkout/abc");
        assert_eq!(initiated.message, DEFAULT_GATEWAY_MESSAGE);
        assert_order_id_format(&initiated.order_id);
    }

    #[tokio::test]
    async fn explicit_gate_overrides_the_default() {
        let mut payment_repo = MockPaymentRepository::new();
        let mut gateway = MockAlifGateway::new();
        let mut notifier = MockPaymentNotifier::new();

        gateway
            .expect_create_payment()
            .withf(|request: &AlifPaymentRequest| request.gate == "korti_milli")
            .returning(|_| Ok(created()));
        payment_repo
            .expect_insert_pending_payment()
            .withf(|record: &InsertPaymentEntity| record.payment_gateway == "korti_milli")
            .returning(|_| Ok(Uuid::new_v4()));
        notifier.expect_notify().return_const(());

        let mut request = mattress_request();
        request.gate = Some("korti_milli".to_string());

        usecase(payment_repo, gateway, notifier)
            .initiate(request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn gateway_rejection_is_returned_verbatim_and_nothing_is_stored() {
        let mut payment_repo = MockPaymentRepository::new();
        let mut gateway = MockAlifGateway::new();
        let mut notifier = MockPaymentNotifier::new();

        gateway.expect_create_payment().returning(|_| {
            Err(AlifGatewayError::Rejected {
                code: -1,
                message: "Неверный токен".to_string(),
            })
        });
        payment_repo.expect_insert_pending_payment().times(0);
        notifier.expect_notify().times(0);

        let err = usecase(payment_repo, gateway, notifier)
            .initiate(mattress_request())
            .await
            .unwrap_err();

        match err {
            PaymentError::GatewayRejection { code, message } => {
                assert_eq!(code, -1);
                assert_eq!(message, "Неверный токен");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_gateway_response_is_a_protocol_error() {
        let mut payment_repo = MockPaymentRepository::new();
        let mut gateway = MockAlifGateway::new();

        gateway.expect_create_payment().returning(|_| {
            Err(AlifGatewayError::Protocol(
                "response is not JSON".to_string(),
            ))
        });
        payment_repo.expect_insert_pending_payment().times(0);

        let err = usecase(payment_repo, gateway, MockPaymentNotifier::new())
            .initiate(mattress_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::GatewayProtocol(_)));
    }

    #[tokio::test]
    async fn failed_insert_after_gateway_success_is_a_persistence_error() {
        let mut payment_repo = MockPaymentRepository::new();
        let mut gateway = MockAlifGateway::new();
        let mut notifier = MockPaymentNotifier::new();

        gateway
            .expect_create_payment()
            .times(1)
            .returning(|_| Ok(created()));
        payment_repo
            .expect_insert_pending_payment()
            .returning(|_| Err(anyhow!("connection refused")));
        notifier.expect_notify().times(0);

        let err = usecase(payment_repo, gateway, notifier)
            .initiate(mattress_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Persistence(_)));
    }
}
