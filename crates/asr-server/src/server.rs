//! `AsrServer`: Axum HTTP server for the transcription pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use asr_transcription::AcousticModel;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::handlers;
use crate::service::ServiceContext;
use crate::shutdown::ShutdownCoordinator;

/// The transcription server.
pub struct AsrServer {
    config: ServerConfig,
    context: Arc<ServiceContext>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl AsrServer {
    /// Create a server around an already-loaded model.
    pub fn new(config: ServerConfig, model: Arc<dyn AcousticModel>) -> Self {
        let context = Arc::new(ServiceContext::new(model, config.inference_workers));
        Self {
            config,
            context,
            shutdown: Arc::new(ShutdownCoordinator::new()),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/ping", get(handlers::ping))
            .route("/asr", post(handlers::asr))
            .with_state(Arc::clone(&self.context))
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and start serving in the background.
    ///
    /// The returned handle carries the bound address (useful with port 0).
    /// Serving stops once the shutdown coordinator fires.
    pub async fn listen(&self) -> std::io::Result<ServerHandle> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let token = self.shutdown.token();

        info!(
            %addr,
            workers = self.context.workers(),
            max_upload_bytes = self.config.max_upload_bytes,
            "asr server listening"
        );

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "server terminated with error");
            }
        });

        Ok(ServerHandle { addr, task })
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// The shared service context.
    pub fn context(&self) -> &Arc<ServiceContext> {
        &self.context
    }
}

/// Handle returned by [`AsrServer::listen`].
#[derive(Debug)]
pub struct ServerHandle {
    /// Address the listener is bound to.
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The serving task, for [`ShutdownCoordinator::drain`].
    pub fn into_task(self) -> JoinHandle<()> {
        self.task
    }
}
