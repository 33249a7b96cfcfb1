// Axum server: forwards every request to the stream interceptor.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Request, State},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::descriptor::StreamDescriptor;
use super::intercept::{StreamInterceptor, STREAM_SCOPE};

pub struct ProxyServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl ProxyServer {
    /// Bind `listen_addr` and serve until `shutdown` is cancelled.
    pub async fn start(
        listen_addr: &str,
        interceptor: Arc<StreamInterceptor>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let listener = TcpListener::bind(listen_addr).await?;
        let addr = listener.local_addr()?;

        let app = Router::new()
            .fallback(intercept_handler)
            .with_state(interceptor);

        let token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!("proxy server stopped with error: {}", e);
            }
            debug!("proxy server on {} exited", addr);
        });

        info!("stream proxy listening on {}", addr);
        Ok(Self { addr, shutdown })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Build the URL a media client should load to stream `descriptor`.
    pub fn url_for_stream(&self, descriptor: &StreamDescriptor) -> String {
        format!("http://{}/{}/{}", self.addr, STREAM_SCOPE, descriptor.encode())
    }

    /// Shutdown the server gracefully.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

async fn intercept_handler(
    State(interceptor): State<Arc<StreamInterceptor>>,
    request: Request,
) -> Response {
    interceptor.handle(request).await
}
