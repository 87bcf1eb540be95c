use std::sync::Arc;

use chrono::Utc;
use sakina_core::{
    domain::{
        entities::{
            orders::InsertOrderEntity,
            payments::{PaymentCallbackChangeset, PaymentEntity},
        },
        repositories::{
            notifications::PaymentNotifier, orders::OrderRepository, payments::PaymentRepository,
        },
        value_objects::{
            alif_callback::AlifCallbackPayload,
            enums::{
                notification_checkpoints::NotificationCheckpoint, payment_statuses::PaymentStatus,
            },
            payment_notifications::PaymentNotification,
        },
    },
    payments::signature::AlifSignature,
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::config_model::{Alif, PublicUrls};

use super::payment_errors::{PaymentError, UseCaseResult};

/// What a callback did to the stored payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The record left `pending` because of this callback.
    Applied(PaymentStatus),
    /// The record was already terminal; the stored status is kept.
    AlreadyTerminal(PaymentStatus),
    /// The gateway still reports the payment as in progress.
    StillPending,
}

impl CallbackOutcome {
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            CallbackOutcome::Applied(status) | CallbackOutcome::AlreadyTerminal(status) => *status,
            CallbackOutcome::StillPending => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackReconciled {
    pub order_id: String,
    pub outcome: CallbackOutcome,
}

/// Applies Alif payment callbacks to stored payments. Safe under redelivery.
pub struct CallbackReconcileUseCase<P, O, N>
where
    P: PaymentRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    N: PaymentNotifier + Send + Sync + 'static,
{
    payment_repo: Arc<P>,
    order_repo: Arc<O>,
    notifier: Arc<N>,
    signature: AlifSignature,
    callback_url: String,
    require_token: bool,
}

impl<P, O, N> CallbackReconcileUseCase<P, O, N>
where
    P: PaymentRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    N: PaymentNotifier + Send + Sync + 'static,
{
    pub fn new(
        payment_repo: Arc<P>,
        order_repo: Arc<O>,
        notifier: Arc<N>,
        alif: &Alif,
        public_urls: &PublicUrls,
    ) -> Self {
        Self {
            payment_repo,
            order_repo,
            notifier,
            signature: AlifSignature::new(alif.merchant_id.clone(), alif.secret_key.clone()),
            callback_url: public_urls.alif_callback_url(),
            require_token: alif.require_callback_token,
        }
    }

    /// Takes the raw body so it can be stored exactly as the gateway sent it.
    pub async fn reconcile(&self, raw_payload: Value) -> UseCaseResult<CallbackReconciled> {
        let payload: AlifCallbackPayload = serde_json::from_value(raw_payload.clone())
            .map_err(|err| {
                warn!(error = %err, "alif_callback: malformed payload");
                PaymentError::Validation(format!("invalid callback payload: {err}"))
            })?;
        let order_id = payload.order_id.clone();

        self.authenticate(&payload)?;

        let payment = self
            .payment_repo
            .find_by_alif_order_id(&order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "alif_callback: payment lookup failed");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| {
                error!(%order_id, "alif_callback: callback for unknown order");
                PaymentError::NotFound(format!("payment {order_id} not found"))
            })?;

        if payload.amount != payment.amount {
            warn!(
                %order_id,
                callback_amount = %payload.amount,
                stored_amount = %payment.amount,
                "alif_callback: amount differs from the stored payment"
            );
        }

        let reported = PaymentStatus::from_gateway_status(&payload.status);
        info!(
            %order_id,
            gateway_status = %payload.status,
            mapped_status = %reported,
            transaction_id = ?payload.transaction_id,
            "alif_callback: callback received"
        );

        let outcome = self
            .apply(&payment, reported, &payload, raw_payload)
            .await?;

        Ok(CallbackReconciled { order_id, outcome })
    }

    fn authenticate(&self, payload: &AlifCallbackPayload) -> UseCaseResult<()> {
        let Some(token) = payload.token() else {
            if self.require_token {
                warn!(order_id = %payload.order_id, "alif_callback: rejected callback without token");
                return Err(PaymentError::Authentication(
                    "callback token is required".to_string(),
                ));
            }
            warn!(
                order_id = %payload.order_id,
                "alif_callback: callback has no token; accepting unverified"
            );
            return Ok(());
        };

        let valid = self.signature.verify_callback(
            &payload.order_id,
            payload.amount,
            &self.callback_url,
            token,
        )?;
        if !valid {
            warn!(
                order_id = %payload.order_id,
                amount = %payload.amount,
                "alif_callback: token mismatch, possible forgery or misconfigured secret"
            );
            return Err(PaymentError::Authentication(
                "invalid callback token".to_string(),
            ));
        }

        Ok(())
    }

    async fn apply(
        &self,
        payment: &PaymentEntity,
        reported: PaymentStatus,
        payload: &AlifCallbackPayload,
        raw_payload: Value,
    ) -> UseCaseResult<CallbackOutcome> {
        let stored = payment.payment_status();
        if stored.is_terminal() {
            if stored != reported {
                warn!(
                    order_id = %payment.alif_order_id,
                    %stored,
                    %reported,
                    "alif_callback: conflicting status for a settled payment; keeping stored status"
                );
            } else {
                info!(
                    order_id = %payment.alif_order_id,
                    %stored,
                    "alif_callback: duplicate callback ignored"
                );
            }
            return Ok(CallbackOutcome::AlreadyTerminal(stored));
        }

        if !reported.is_terminal() {
            info!(order_id = %payment.alif_order_id, "alif_callback: payment still in progress");
            return Ok(CallbackOutcome::StillPending);
        }

        let changeset = PaymentCallbackChangeset {
            status: reported.as_str().to_string(),
            alif_transaction_id: payload.transaction_id.clone(),
            alif_callback_payload: Some(raw_payload),
            updated_at: Utc::now(),
        };

        let updated = self
            .payment_repo
            .transition_from_pending(payment.id, changeset)
            .await
            .map_err(|err| {
                error!(
                    order_id = %payment.alif_order_id,
                    db_error = ?err,
                    "alif_callback: failed to update payment"
                );
                PaymentError::Internal(err)
            })?;

        let Some(updated) = updated else {
            return self.settled_concurrently(payment, reported).await;
        };

        info!(
            payment_id = %updated.id,
            order_id = %updated.alif_order_id,
            status = %reported,
            "alif_callback: payment settled"
        );

        if reported == PaymentStatus::Completed {
            self.synthesize_order(&updated).await;
        }

        Ok(CallbackOutcome::Applied(reported))
    }

    /// Another delivery won the conditional update; report what it stored.
    async fn settled_concurrently(
        &self,
        payment: &PaymentEntity,
        reported: PaymentStatus,
    ) -> UseCaseResult<CallbackOutcome> {
        let current = self
            .payment_repo
            .find_by_alif_order_id(&payment.alif_order_id)
            .await
            .map_err(PaymentError::Internal)?
            .ok_or_else(|| {
                PaymentError::NotFound(format!("payment {} not found", payment.alif_order_id))
            })?;

        let stored = current.payment_status();
        warn!(
            order_id = %payment.alif_order_id,
            %stored,
            %reported,
            "alif_callback: payment was settled by a concurrent callback"
        );

        Ok(CallbackOutcome::AlreadyTerminal(stored))
    }

    /// Order bookkeeping failures are logged, never surfaced: the payment itself succeeded
    /// and a gateway retry would not fix them.
    async fn synthesize_order(&self, payment: &PaymentEntity) {
        let order = InsertOrderEntity::confirmed_from_payment(payment);

        match self.order_repo.insert_confirmed_order(order).await {
            Ok(Some(order_id)) => {
                info!(
                    %order_id,
                    payment_id = %payment.id,
                    "alif_callback: confirmed order created"
                );
                self.notifier.notify(PaymentNotification::from_payment(
                    payment,
                    NotificationCheckpoint::Confirmed,
                ));
            }
            Ok(None) => {
                info!(
                    payment_id = %payment.id,
                    "alif_callback: confirmed order already exists"
                );
            }
            Err(err) => {
                error!(
                    payment_id = %payment.id,
                    order_id = %payment.alif_order_id,
                    db_error = ?err,
                    "alif_callback: payment completed but the order could not be created"
                );
            }
        }
    }
}
