use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::{
        payment_callback::CallbackReconcileUseCase, payment_initiation::PaymentInitiationUseCase,
        payment_status::PaymentStatusUseCase,
    },
};
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use sakina_core::{
    domain::value_objects::payment_notifications::PaymentNotification,
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{orders::OrderPostgres, payments::PaymentPostgres},
        },
        sms::sms_gateway::SmsGatewayProvider,
    },
    notifications::{payment_dispatcher::PaymentNotificationDispatcher, queue::DeliveryProvider},
    payments::alif_client::AlifClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

const ALIF_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest("/api/v1/payments", payment_routes(&config, &db_pool)?)
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn payment_routes(config: &DotEnvyConfig, db_pool: &Arc<PgPoolSquad>) -> Result<Router> {
    let payment_repository = Arc::new(PaymentPostgres::new(Arc::clone(db_pool)));
    let order_repository = Arc::new(OrderPostgres::new(Arc::clone(db_pool)));
    let alif_client = Arc::new(
        AlifClient::new(config.alif.api_url.clone(), ALIF_HTTP_TIMEOUT)
            .context("failed to build alif client")?,
    );
    let notifier = Arc::new(payment_notifier(config));

    let initiation = PaymentInitiationUseCase::new(
        Arc::clone(&payment_repository),
        alif_client,
        Arc::clone(&notifier),
        &config.alif,
        config.public_urls.clone(),
    );
    let callback = CallbackReconcileUseCase::new(
        Arc::clone(&payment_repository),
        order_repository,
        notifier,
        &config.alif,
        &config.public_urls,
    );
    let status = PaymentStatusUseCase::new(payment_repository);

    if !config.alif.require_callback_token {
        warn!("alif callbacks without a token will be accepted unverified");
    }
    info!(
        callback_url = %config.public_urls.alif_callback_url(),
        default_gate = %config.alif.default_gate,
        "Alif payments configured"
    );

    Ok(routers::payments::routes(
        Arc::new(initiation),
        Arc::new(callback),
        Arc::new(status),
    ))
}

/// Staff SMS is optional; a broken SMS setup must not keep payments from starting.
fn payment_notifier(config: &DotEnvyConfig) -> PaymentNotificationDispatcher {
    let Some(sms) = config.sms.clone() else {
        return PaymentNotificationDispatcher::disabled();
    };

    match SmsGatewayProvider::new(sms) {
        Ok(provider) => {
            let providers: Vec<Arc<dyn DeliveryProvider<PaymentNotification>>> =
                vec![Arc::new(provider)];
            PaymentNotificationDispatcher::spawn(providers)
        }
        Err(err) => {
            warn!(error = %err, "sms provider could not be created; staff notifications disabled");
            PaymentNotificationDispatcher::disabled()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
