//! Server bootstrap
//!
//! Runs the gRPC server and the REST gateway side by side. Both share one
//! cancellation token: a shutdown signal, or either server failing, stops
//! the other one as well.

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use axum::Router;
use sqlx::PgPool;
use tokio::{net::TcpListener, signal};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, GrpcConfig},
    grpc::{UserApi, make_user_service},
    routes::create_router,
    service::UserRequestService,
    state::AppState,
};

/// Bound listeners of both servers
pub struct Listeners {
    grpc: TcpListener,
    rest: TcpListener,
}

impl Listeners {
    pub async fn bind(config: &AppConfig) -> Result<Self> {
        let grpc_addr: SocketAddr = config.grpc.address().parse()?;
        let rest_addr: SocketAddr = config.rest.address().parse()?;

        let listeners = Self {
            grpc: TcpListener::bind(grpc_addr).await?,
            rest: TcpListener::bind(rest_addr).await?,
        };
        info!("gRPC server bound on {}", listeners.grpc_addr()?);
        info!("REST gateway bound on {}", listeners.rest_addr()?);

        Ok(listeners)
    }

    pub fn grpc_addr(&self) -> std::io::Result<SocketAddr> {
        self.grpc.local_addr()
    }

    pub fn rest_addr(&self) -> std::io::Result<SocketAddr> {
        self.rest.local_addr()
    }
}

/// Bind both servers and run them until SIGINT or SIGTERM
pub async fn run(
    config: &AppConfig,
    service: Arc<dyn UserRequestService>,
    db_pool: PgPool,
) -> Result<()> {
    let listeners = Listeners::bind(config).await?;
    serve(
        listeners,
        config.grpc.clone(),
        service,
        db_pool,
        shutdown_signal(),
    )
    .await
}

/// Serve on already bound listeners until `shutdown` resolves
pub async fn serve<S>(
    listeners: Listeners,
    grpc_config: GrpcConfig,
    service: Arc<dyn UserRequestService>,
    db_pool: PgPool,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()> + Send,
{
    let cancel = CancellationToken::new();
    let api = Arc::new(UserApi::new(service));
    let state = AppState::new(db_pool, api.clone());

    let grpc_task = tokio::spawn(serve_grpc(
        listeners.grpc,
        api,
        grpc_config,
        cancel.clone(),
    ));
    let rest_task = tokio::spawn(serve_rest(
        listeners.rest,
        create_router(state.clone()),
        cancel.clone(),
    ));

    state.set_ready(true);
    info!("Users service is ready");

    tokio::select! {
        _ = shutdown => info!("Shutdown signal received"),
        _ = cancel.cancelled() => warn!("A server stopped unexpectedly, shutting down"),
    }

    state.set_ready(false);
    cancel.cancel();

    let (grpc_result, rest_result) = tokio::join!(grpc_task, rest_task);
    grpc_result??;
    rest_result??;

    info!("Users service stopped");
    Ok(())
}

async fn serve_grpc(
    listener: TcpListener,
    api: Arc<UserApi>,
    config: GrpcConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let cancel_for_server = cancel.clone();
    let shutdown = async move {
        cancel_for_server.cancelled().await;
        info!("gRPC server shutting down");
    };

    let result = Server::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .http2_keepalive_interval(Some(Duration::from_secs(config.keepalive_interval_secs)))
        .http2_keepalive_timeout(Some(Duration::from_secs(config.keepalive_timeout_secs)))
        .trace_fn(|request| tracing::info_span!("grpc", path = %request.uri().path()))
        .add_service(make_user_service(api))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
        .map_err(|e| anyhow!("gRPC server error: {}", e));

    if result.is_err() {
        cancel.cancel();
    }
    result
}

async fn serve_rest(listener: TcpListener, app: Router, cancel: CancellationToken) -> Result<()> {
    let cancel_for_server = cancel.clone();
    let shutdown = async move {
        cancel_for_server.cancelled().await;
        info!("REST gateway shutting down");
    };

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow!("REST server error: {}", e));

    if result.is_err() {
        cancel.cancel();
    }
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
