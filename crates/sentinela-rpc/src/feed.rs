use async_trait::async_trait;
use ethers::prelude::*;
use futures::StreamExt;
use sentinela_core::{
    error::{Error, Result},
    traits::PendingTransactionSource,
    types::PendingTransaction,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Feed de transações pendentes via `eth_subscribe("newPendingTransactions")`.
///
/// Cada hash recebido é resolvido para a transação completa com até
/// `fetch_concurrency` buscas simultâneas.
#[derive(Debug, Clone)]
pub struct WsPendingFeed {
    endpoint: String,
    fetch_concurrency: usize,
}

impl WsPendingFeed {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            fetch_concurrency: 64,
        }
    }

    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Converte a transação do ethers para o tipo da workspace.
pub fn to_pending(tx: &Transaction) -> PendingTransaction {
    PendingTransaction {
        hash: tx.hash,
        from: tx.from,
        to: tx.to,
        gas_price: tx.gas_price,
        value: tx.value,
        input: tx.input.to_vec(),
    }
}

#[async_trait]
impl PendingTransactionSource for WsPendingFeed {
    async fn stream(&self, sink: mpsc::Sender<PendingTransaction>) -> Result<()> {
        let ws = Ws::connect(self.endpoint.as_str())
            .await
            .map_err(|e| Error::FeedDisconnected(format!("falha ao conectar via websocket: {}", e)))?;
        let provider = Provider::new(ws);

        let mut stream = provider
            .subscribe_pending_txs()
            .await
            .map_err(|e| Error::FeedDisconnected(format!("falha na inscrição: {}", e)))?
            .transactions_unordered(self.fetch_concurrency);
        info!(endpoint = %self.endpoint, "escutando transações pendentes");

        while let Some(res) = stream.next().await {
            match res {
                Ok(tx) => {
                    if sink.send(to_pending(&tx)).await.is_err() {
                        // receptor encerrado: fim normal
                        return Ok(());
                    }
                }
                // transações muito recentes às vezes ainda não estão disponíveis
                Err(e) => debug!(error = %e, "falha ao buscar transação pendente"),
            }
        }

        Err(Error::FeedDisconnected("inscrição encerrada pelo node".into()))
    }
}
