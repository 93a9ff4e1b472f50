use std::env;
use std::sync::Arc;

use anyhow::Context;
use sentinela_detector::{
    DetectionEngine, DetectorConfig, EndpointConfig, LiquidityOracle, ReconnectingFeed,
    RpcLiquidityOracle, ThresholdSink, TracingAlertSink,
};
use sentinela_rpc::{RpcConfig, SentinelaRpcClient, WsPendingFeed};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Uso: SENTINELA_WS_URL=ws://... [SENTINELA_HTTP_URL=http://...] mempool_watch [config.json]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let endpoints = EndpointConfig::from_env().context("endpoints do node")?;
    let config = match env::args().nth(1) {
        Some(path) => DetectorConfig::from_json_file(&path).with_context(|| format!("config {}", path))?,
        None => DetectorConfig::default(),
    };

    let oracle: Option<Arc<dyn LiquidityOracle>> = match &endpoints.http_url {
        Some(url) => {
            let client = SentinelaRpcClient::new(RpcConfig {
                endpoint: url.clone(),
                timeout: config.oracle_timeout(),
                ..Default::default()
            })
            .await
            .context("cliente RPC do oráculo")?;
            Some(Arc::new(
                RpcLiquidityOracle::new(client).with_call_timeout(config.oracle_timeout()),
            ))
        }
        None => {
            warn!("{} não definida: apenas modo básico", sentinela_detector::HTTP_URL_ENV);
            None
        }
    };

    let sink = Arc::new(ThresholdSink::new(TracingAlertSink, config.alert_min_confidence));
    let feed = ReconnectingFeed::new(WsPendingFeed::new(endpoints.ws_url.clone()))
        .with_retry_delay(config.feed_retry_delay());
    let engine = Arc::new(DetectionEngine::new(config, oracle));

    let (tx, rx) = mpsc::channel(1024);
    let feed_task = tokio::spawn(async move { feed.run(tx).await });
    info!(ws = %endpoints.ws_url, enhanced = engine.has_oracle(), "sentinela iniciado");

    engine.run(rx, sink).await;
    feed_task.await?.context("feed de transações")?;
    Ok(())
}
