use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::config::StreamConfig;
use crate::engine::correlation::CorrelationTable;
use crate::engine::dispatcher::TaskDispatcher;
use crate::engine::inbound::InboundHandler;
use crate::engine::stats::{StatsCollector, StatsSnapshot};
use crate::server::descriptor::StreamDescriptor;
use crate::server::handler::ProxyServer;
use crate::server::intercept::StreamInterceptor;
use crate::source::channel::{worker_link, WorkerEndpoint};
use crate::source::traits::PartFetcher;
use crate::source::worker::ChunkWorker;

/// A running stream proxy: HTTP server, reply pump and correlation table.
pub struct StreamProxy {
    server: ProxyServer,
    table: Arc<CorrelationTable>,
    stats: Arc<StatsCollector>,
    shutdown: CancellationToken,
}

impl StreamProxy {
    /// Start the proxy. The returned endpoint is where chunk tasks arrive and
    /// where their replies must be posted.
    pub async fn launch(config: StreamConfig) -> Result<(Self, WorkerEndpoint)> {
        config.validate()?;

        let (proxy_end, worker_end) = worker_link();
        let table = Arc::new(CorrelationTable::new());
        let stats = Arc::new(StatsCollector::new());
        let shutdown = CancellationToken::new();

        let inbound = Arc::new(InboundHandler::new(table.clone(), stats.clone()));
        tokio::spawn(inbound.run(proxy_end.replies, shutdown.clone()));

        let dispatcher = TaskDispatcher::new(table.clone(), Arc::new(proxy_end.tasks), stats.clone());
        let interceptor = Arc::new(StreamInterceptor::new(config.clone(), dispatcher, stats.clone()));
        let server = ProxyServer::start(&config.listen_addr, interceptor, shutdown.clone()).await?;

        Ok((
            Self {
                server,
                table,
                stats,
                shutdown,
            },
            worker_end,
        ))
    }

    /// Start the proxy together with an in-process worker driven by `fetcher`.
    pub async fn launch_with_fetcher(
        config: StreamConfig,
        fetcher: Arc<dyn PartFetcher>,
        max_concurrency: u32,
    ) -> Result<Self> {
        let (proxy, endpoint) = Self::launch(config).await?;
        let worker = ChunkWorker::new(fetcher, max_concurrency);
        tokio::spawn(worker.run(endpoint, proxy.shutdown.clone()));
        Ok(proxy)
    }

    /// URL a media client should load to stream `descriptor`.
    pub fn stream_url(&self, descriptor: &StreamDescriptor) -> String {
        self.server.url_for_stream(descriptor)
    }

    pub fn port(&self) -> u16 {
        self.server.port()
    }

    /// Return a snapshot of current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.table.len())
    }

    /// Stop the server, the reply pump and any worker started with it.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for StreamProxy {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
