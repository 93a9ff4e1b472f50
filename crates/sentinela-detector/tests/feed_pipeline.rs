use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use parking_lot::Mutex;
use sentinela_core::error::{Error, Result};
use sentinela_core::traits::PendingTransactionSource;
use sentinela_core::types::{PendingTransaction, RiskLevel};
use sentinela_detector::{
    ChannelAlertSink, DetectionEngine, DetectorConfig, ReconnectingFeed, RiskRule, ThresholdSink,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Entrega lotes de transações; cada lote termina com uma queda, exceto o último.
struct ScriptedSource {
    batches: Mutex<VecDeque<Vec<PendingTransaction>>>,
}

#[async_trait]
impl PendingTransactionSource for ScriptedSource {
    async fn stream(&self, sink: mpsc::Sender<PendingTransaction>) -> Result<()> {
        let (batch, last) = {
            let mut batches = self.batches.lock();
            let batch = batches.pop_front().unwrap_or_default();
            (batch, batches.is_empty())
        };
        for tx in batch {
            if sink.send(tx).await.is_err() {
                return Ok(());
            }
        }
        if last {
            Ok(())
        } else {
            Err(Error::FeedDisconnected("socket fechado".into()))
        }
    }
}

fn tx(n: u8, to: Address, gas: u64) -> PendingTransaction {
    PendingTransaction::new(H256::repeat_byte(n), Address::repeat_byte(n), Some(to))
        .with_gas_price(U256::from(gas))
}

#[tokio::test]
async fn alerts_flow_from_feed_to_threshold_sink_across_reconnects() {
    let router = DetectorConfig::default().known_routers[0].address;
    let other = Address::repeat_byte(0x12);
    let source = ScriptedSource {
        batches: Mutex::new(VecDeque::from(vec![
            // janela de gás estável
            vec![tx(1, other, 100), tx(2, other, 100), tx(3, other, 100)],
            // router sem pico (40) e pico em endereço comum (55)
            vec![tx(4, router, 100), tx(5, other, 300)],
            // router com pico (85)
            vec![tx(6, router, 1_000)],
        ])),
    };
    let feed = ReconnectingFeed::new(source).with_retry_delay(Duration::from_millis(5));

    let config = DetectorConfig::default();
    let min_confidence = config.alert_min_confidence;
    let engine = Arc::new(DetectionEngine::new(config, None));
    let (channel, mut alerts) = ChannelAlertSink::new(16);
    let sink = Arc::new(ThresholdSink::new(channel, min_confidence));

    let (tx_in, rx) = mpsc::channel(1);
    let feed_task = tokio::spawn(async move { feed.run(tx_in).await });
    engine.clone().run(rx, sink).await;
    feed_task.await.unwrap().unwrap();

    let mut kept = Vec::new();
    while let Some(alert) = alerts.recv().await {
        kept.push(alert);
    }
    assert_eq!(kept.len(), 1);
    let alert = &kept[0];
    assert_eq!(alert.tx_hash, H256::repeat_byte(6));
    assert_eq!(alert.rules, vec![RiskRule::IsDexRouter, RiskRule::GasPriceSpike]);
    assert_eq!(alert.confidence, 85);
    assert_eq!(alert.risk_level, RiskLevel::High);

    // estado preservado entre reconexões
    assert_eq!(engine.gas_window().len(), 6);
}
