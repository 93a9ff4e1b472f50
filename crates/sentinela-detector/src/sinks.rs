use async_trait::async_trait;
use sentinela_core::{
    error::{Error, Result},
    utils::format_h256,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{alert::Alert, traits::AlertSink};

/// Entrega alertas em um canal [`tokio::sync::mpsc`] para consumidores externos.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    sender: mpsc::Sender<Alert>,
}

impl ChannelAlertSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Alert>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { sender: tx }, rx)
    }

    pub fn sender(&self) -> mpsc::Sender<Alert> {
        self.sender.clone()
    }
}

#[async_trait]
impl AlertSink for ChannelAlertSink {
    async fn emit(&self, alert: Alert) -> Result<()> {
        self.sender
            .send(alert)
            .await
            .map_err(|_| Error::Other("canal de alertas fechado".into()))
    }
}

/// Repassa apenas alertas com confiança mínima (70 por padrão).
#[derive(Debug, Clone)]
pub struct ThresholdSink<S> {
    inner: S,
    min_confidence: u8,
}

impl<S> ThresholdSink<S> {
    pub fn new(inner: S, min_confidence: u8) -> Self {
        Self { inner, min_confidence }
    }

    pub fn min_confidence(&self) -> u8 {
        self.min_confidence
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: AlertSink> AlertSink for ThresholdSink<S> {
    async fn emit(&self, alert: Alert) -> Result<()> {
        if alert.confidence < self.min_confidence {
            debug!(tx = %format_h256(&alert.tx_hash), confidence = alert.confidence, "alerta abaixo do limiar");
            return Ok(());
        }
        self.inner.emit(alert).await
    }
}

/// Registra cada alerta como evento `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn emit(&self, alert: Alert) -> Result<()> {
        let impact = alert.enhanced().map(|e| e.impact.price_impact_pct);
        info!(
            tx = %format_h256(&alert.tx_hash),
            level = %alert.risk_level,
            confidence = alert.confidence,
            rules = ?alert.rule_names(),
            price_impact_pct = ?impact,
            est_loss_usd = alert.est_loss_usd,
            "alerta MEV"
        );
        Ok(())
    }
}
