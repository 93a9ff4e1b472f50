use sentinela_core::{
    error::{Error, Result},
    traits::PendingTransactionSource,
    types::PendingTransaction,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Intervalo padrão entre tentativas de reconexão.
pub const DEFAULT_FEED_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Mantém um [`PendingTransactionSource`] ativo, reconectando após quedas.
///
/// O estado do motor (janela de gás e buffer) vive fora do feed e sobrevive
/// às reconexões.
pub struct ReconnectingFeed<S> {
    source: S,
    retry_delay: Duration,
    max_attempts: Option<u32>,
}

impl<S: PendingTransactionSource> ReconnectingFeed<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            retry_delay: DEFAULT_FEED_RETRY_DELAY,
            max_attempts: None,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Limita o número de reconexões; sem limite por padrão.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Encaminha transações para `sink` até o receptor ser fechado.
    ///
    /// Falhas do feed são registradas e seguidas de nova tentativa após
    /// `retry_delay`. Só retorna erro ao esgotar `max_attempts`.
    pub async fn run(&self, sink: mpsc::Sender<PendingTransaction>) -> Result<()> {
        let mut failures: u32 = 0;
        loop {
            match self.source.stream(sink.clone()).await {
                Ok(()) => {
                    info!("feed encerrado pelo consumidor");
                    return Ok(());
                }
                Err(e) => {
                    if sink.is_closed() {
                        return Ok(());
                    }
                    failures += 1;
                    if let Some(max) = self.max_attempts {
                        if failures > max {
                            return Err(Error::FeedDisconnected(format!(
                                "feed indisponível após {} tentativas: {}",
                                max, e
                            )));
                        }
                    }
                    warn!(
                        error = %e,
                        attempt = failures,
                        retry_in_ms = self.retry_delay.as_millis() as u64,
                        "feed de transações caiu, reconectando"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ethereum_types::{Address, H256};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Falha nas primeiras `failures` conexões e depois entrega uma transação.
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PendingTransactionSource for FlakySource {
        async fn stream(&self, sink: mpsc::Sender<PendingTransaction>) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(Error::FeedDisconnected("queda simulada".into()));
            }
            let tx = PendingTransaction::new(H256::repeat_byte(n as u8), Address::zero(), None);
            let _ = sink.send(tx).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn reconnects_after_failures() {
        let feed = ReconnectingFeed::new(FlakySource { failures: 2, calls: AtomicU32::new(0) })
            .with_retry_delay(Duration::from_millis(1));
        let (tx, mut rx) = mpsc::channel(4);
        feed.run(tx).await.unwrap();
        assert_eq!(feed.source().calls.load(Ordering::SeqCst), 3);
        assert_eq!(rx.recv().await.unwrap().hash, H256::repeat_byte(2));
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let feed = ReconnectingFeed::new(FlakySource { failures: 10, calls: AtomicU32::new(0) })
            .with_retry_delay(Duration::from_millis(1))
            .with_max_attempts(2);
        let (tx, _rx) = mpsc::channel(4);
        let err = feed.run(tx).await.unwrap_err();
        assert!(matches!(err, Error::FeedDisconnected(_)));
        assert_eq!(feed.source().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_when_receiver_is_gone() {
        let feed = ReconnectingFeed::new(FlakySource { failures: 100, calls: AtomicU32::new(0) })
            .with_retry_delay(Duration::from_millis(1));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        feed.run(tx).await.unwrap();
        assert_eq!(feed.source().calls.load(Ordering::SeqCst), 1);
    }
}
