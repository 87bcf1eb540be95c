use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sakina_core::domain::repositories::{
    notifications::PaymentNotifier, orders::OrderRepository, payments::PaymentRepository,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::usecases::{
    payment_callback::CallbackReconcileUseCase,
    payment_errors::PaymentError,
    payment_initiation::{
        AlifGateway, InitiatePaymentRequest, PaymentInitiated, PaymentInitiationUseCase,
    },
    payment_status::{PaymentStatusUseCase, PaymentStatusView},
};

const CALLBACK_PROCESSED: &str = "callback_processed";

#[derive(Debug, Serialize)]
struct InitiatePaymentResponse {
    success: bool,
    #[serde(flatten)]
    payment: PaymentInitiated,
}

#[derive(Debug, Serialize)]
struct CallbackResponse {
    success: bool,
    status: &'static str,
    payment_status: String,
    order_id: String,
}

#[derive(Debug, Serialize)]
struct PaymentStatusResponse {
    success: bool,
    #[serde(flatten)]
    payment: PaymentStatusView,
}

pub fn routes<P, O, G, N>(
    initiation: Arc<PaymentInitiationUseCase<P, G, N>>,
    callback: Arc<CallbackReconcileUseCase<P, O, N>>,
    status: Arc<PaymentStatusUseCase<P>>,
) -> Router
where
    P: PaymentRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    G: AlifGateway + 'static,
    N: PaymentNotifier + Send + Sync + 'static,
{
    Router::new()
        .route("/alif/initiate", post(initiate::<P, G, N>))
        .with_state(initiation)
        .merge(
            Router::new()
                .route("/alif/callback", post(alif_callback::<P, O, N>))
                .with_state(callback),
        )
        .merge(
            Router::new()
                .route("/alif/:order_id/status", get(payment_status::<P>))
                .with_state(status),
        )
}

/// Body rejections are answered in the payment error envelope instead of axum's plain text.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, PaymentError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| PaymentError::Validation(rejection.body_text()))
}

pub async fn initiate<P, G, N>(
    State(usecase): State<Arc<PaymentInitiationUseCase<P, G, N>>>,
    body: Result<Json<InitiatePaymentRequest>, JsonRejection>,
) -> Response
where
    P: PaymentRepository + Send + Sync + 'static,
    G: AlifGateway + 'static,
    N: PaymentNotifier + Send + Sync + 'static,
{
    let result = match json_body(body) {
        Ok(request) => usecase.initiate(request).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(payment) => (
            StatusCode::OK,
            Json(InitiatePaymentResponse {
                success: true,
                payment,
            }),
        )
            .into_response(),
        Err(err) => {
            warn!(
                status = err.status_code().as_u16(),
                error = %err,
                "payments router: initiate failed"
            );
            err.into_response()
        }
    }
}

/// Takes any JSON value so the raw payload can be stored as the gateway sent it.
pub async fn alif_callback<P, O, N>(
    State(usecase): State<Arc<CallbackReconcileUseCase<P, O, N>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    P: PaymentRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    N: PaymentNotifier + Send + Sync + 'static,
{
    let result = match json_body(body) {
        Ok(payload) => usecase.reconcile(payload).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(reconciled) => {
            info!(
                order_id = %reconciled.order_id,
                outcome = ?reconciled.outcome,
                "payments router: callback processed"
            );
            (
                StatusCode::OK,
                Json(CallbackResponse {
                    success: true,
                    status: CALLBACK_PROCESSED,
                    payment_status: reconciled.outcome.payment_status().to_string(),
                    order_id: reconciled.order_id,
                }),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                status = err.status_code().as_u16(),
                error = %err,
                "payments router: callback rejected"
            );
            err.into_response()
        }
    }
}

pub async fn payment_status<P>(
    State(usecase): State<Arc<PaymentStatusUseCase<P>>>,
    Path(order_id): Path<String>,
) -> Response
where
    P: PaymentRepository + Send + Sync + 'static,
{
    match usecase.get_status(&order_id).await {
        Ok(payment) => (
            StatusCode::OK,
            Json(PaymentStatusResponse {
                success: true,
                payment,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
