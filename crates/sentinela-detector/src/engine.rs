use ethereum_types::Address;
use sentinela_core::{
    error::Error,
    types::PendingTransaction,
    utils::{format_h256, u256_to_f64, with_timeout},
};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{
    alert::Alert,
    analysis::{AnalysisOutcome, AnalysisStage, EnhancedData, FallbackReason},
    clock::{Clock, SystemClock},
    config::DetectorConfig,
    decoder::decode_swap,
    gas_window::GasWindow,
    impact::compute_impact,
    risk::{EnhancedSignals, RiskScorer, RiskSignals},
    sandwich_buffer::{BufferedEntry, SandwichBuffer},
    traits::{AlertSink, LiquidityOracle},
};

/// Motor de detecção: dono da janela de gás e do buffer de correlação.
///
/// Cada instância tem seu próprio estado; várias podem coexistir (por exemplo,
/// uma por chain). `analyze` pode ser chamado concorrentemente.
pub struct DetectionEngine {
    config: DetectorConfig,
    scorer: RiskScorer,
    gas_window: GasWindow,
    buffer: SandwichBuffer,
    oracle: Option<Arc<dyn LiquidityOracle>>,
    clock: Arc<dyn Clock>,
}

impl DetectionEngine {
    /// Sem oráculo o motor opera apenas no modo básico.
    pub fn new(config: DetectorConfig, oracle: Option<Arc<dyn LiquidityOracle>>) -> Self {
        Self {
            scorer: RiskScorer::new(config.thresholds.clone()),
            gas_window: GasWindow::new(config.thresholds.gas_window_capacity),
            buffer: SandwichBuffer::new(config.thresholds.buffer_capacity),
            oracle,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn gas_window(&self) -> &GasWindow {
        &self.gas_window
    }

    pub fn buffer(&self) -> &SandwichBuffer {
        &self.buffer
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Analisa uma transação pendente e produz o alerta correspondente.
    ///
    /// Nunca falha: qualquer problema na etapa enriquecida cai para o modo
    /// básico e fica registrado em `payload.analysis`.
    pub async fn analyze(&self, tx: &PendingTransaction) -> Alert {
        let span = info_span!("analyze_tx", tx = %format_h256(&tx.hash));
        self.analyze_inner(tx).instrument(span).await
    }

    async fn analyze_inner(&self, tx: &PendingTransaction) -> Alert {
        // GasRecorded
        let gas_price = tx.gas_price.map(|g| u256_to_f64(&g));
        let gas_median = match gas_price {
            Some(gp) => self.gas_window.record_and_median(gp),
            None => self.gas_window.median(),
        };

        // RouterCheck
        let router = tx.to.filter(|to| self.config.is_known_router(to));

        let mut outcome: AnalysisOutcome = match (router, &self.oracle) {
            (None, _) => FallbackReason::NotRouter.into(),
            (Some(_), None) => FallbackReason::OracleDisabled.into(),
            (Some(router), Some(oracle)) => {
                match with_timeout(
                    self.config.analysis_timeout(),
                    "análise enriquecida",
                    async { Ok::<_, Error>(self.enhanced_analysis(oracle.as_ref(), tx, router).await) },
                )
                .await
                {
                    Ok(Ok(data)) => AnalysisOutcome::Enhanced(data),
                    Ok(Err(reason)) => reason.into(),
                    Err(_) => FallbackReason::Timeout {
                        stage: AnalysisStage::EnhancedAnalysis,
                    }
                    .into(),
                }
            }
        };

        if let Some(reason) = outcome.fallback_reason() {
            if reason.is_expected() {
                debug!(reason = ?reason, "modo básico");
            } else {
                warn!(reason = ?reason, "análise enriquecida falhou, usando modo básico");
            }
        }

        // SandwichCheck: toda tentativa de análise enriquecida entra no buffer
        if router.is_some() && self.oracle.is_some() {
            let entry = BufferedEntry {
                hash: tx.hash,
                from: tx.from,
                enhanced: outcome.enhanced().cloned(),
                timestamp_ms: self.clock.now_ms(),
            };
            let found = self
                .buffer
                .correlate_and_append(entry, self.config.thresholds.sandwich_window_ms);
            if let (AnalysisOutcome::Enhanced(data), Some(m)) = (&mut outcome, found) {
                info!(attacker = ?m.attacker, frontrun = %format_h256(&m.frontrun), backrun = %format_h256(&m.backrun), "sequência sanduíche detectada");
                data.sandwich = Some(m);
            }
        }

        // Scored
        let signals = RiskSignals {
            is_dex_router: router.is_some(),
            enhanced: outcome.enhanced().map(EnhancedSignals::from),
            gas_price,
            gas_median,
        };
        let assessment = self.scorer.score(&signals);
        let loss = self.scorer.estimate_loss(&assessment, outcome.enhanced());
        debug!(
            level = %assessment.level,
            confidence = assessment.confidence,
            rules = ?assessment.rules,
            "transação classificada"
        );

        Alert::new(tx.clone(), assessment, loss, outcome)
    }

    async fn enhanced_analysis(
        &self,
        oracle: &dyn LiquidityOracle,
        tx: &PendingTransaction,
        router: Address,
    ) -> std::result::Result<EnhancedData, FallbackReason> {
        let swap = decode_swap(&tx.input, tx.value).ok_or(FallbackReason::DecodeMiss)?;
        if swap.amount_in.is_zero() {
            return Err(FallbackReason::ZeroAmountIn);
        }
        let token_in = swap.token_in();
        let token_out = swap.token_out();
        let factory = self
            .config
            .factory_for_router(&router)
            .ok_or(FallbackReason::UnknownFactory)?;

        let timeout = self.config.oracle_timeout();
        let pair = with_timeout(timeout, "getPair", oracle.resolve_pair(factory, token_in, token_out))
            .await
            .map_err(|e| stage_error(AnalysisStage::Resolve, e))?
            .ok_or(FallbackReason::PairNotFound)?;

        let reserves = with_timeout(timeout, "getReserves", oracle.get_reserves(pair, token_in))
            .await
            .map_err(|e| stage_error(AnalysisStage::Reserves, e))?
            .ok_or(FallbackReason::TokenNotInPair)?;

        let impact = compute_impact(swap.amount_in, reserves.reserve_in, reserves.reserve_out);

        Ok(EnhancedData {
            swap,
            token_in,
            token_out,
            pair,
            reserve_in: reserves.reserve_in,
            reserve_out: reserves.reserve_out,
            impact,
            sandwich: None,
        })
    }

    /// Consome transações de `rx`, analisando cada uma em sua própria task.
    ///
    /// Até `max_concurrent_analyses` análises rodam ao mesmo tempo. Retorna
    /// quando o canal é fechado e todas as análises em andamento terminam.
    pub async fn run<S>(self: Arc<Self>, mut rx: mpsc::Receiver<PendingTransaction>, sink: Arc<S>)
    where
        S: AlertSink + ?Sized + 'static,
    {
        let limit = self.config.max_concurrent_analyses.clamp(1, u32::MAX as usize);
        let permits = Arc::new(Semaphore::new(limit));

        while let Some(tx) = rx.recv().await {
            let permit = match permits.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => break,
            };
            let engine = self.clone();
            let sink = sink.clone();
            tokio::spawn(async move {
                let alert = engine.analyze(&tx).await;
                if let Err(e) = sink.emit(alert).await {
                    warn!(tx = %format_h256(&tx.hash), error = %e, "falha ao entregar alerta");
                }
                drop(permit);
            });
        }

        // aguarda as análises em andamento
        let _ = permits.acquire_many(limit as u32).await;
        info!("motor de detecção encerrado");
    }
}

fn stage_error(stage: AnalysisStage, e: Error) -> FallbackReason {
    if e.is_timeout() {
        FallbackReason::Timeout { stage }
    } else {
        FallbackReason::OracleError {
            stage,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use ethereum_types::{H256, U256};
    use sentinela_core::types::RiskLevel;

    fn router() -> Address {
        DetectorConfig::default().known_routers[0].address
    }

    fn tx(n: u8, to: Address, gas: u64) -> PendingTransaction {
        PendingTransaction::new(H256::repeat_byte(n), Address::repeat_byte(0x55), Some(to))
            .with_gas_price(U256::from(gas))
    }

    #[tokio::test]
    async fn basic_mode_without_oracle() {
        let engine = DetectionEngine::new(DetectorConfig::default(), None);
        let alert = engine.analyze(&tx(1, router(), 100)).await;
        assert_eq!(alert.risk_level, RiskLevel::Medium);
        assert_eq!(alert.confidence, 40);
        assert_eq!(alert.rule_names(), vec!["isDexRouter"]);
        assert_eq!(
            alert.payload.analysis.fallback_reason(),
            Some(&FallbackReason::OracleDisabled)
        );
        assert_eq!(alert.est_loss_usd, 2.5);
        assert!(engine.buffer().is_empty());
    }

    #[tokio::test]
    async fn first_sample_is_its_own_median() {
        let engine = DetectionEngine::new(DetectorConfig::default(), None);
        let alert = engine.analyze(&tx(1, Address::repeat_byte(9), 1_000_000)).await;
        assert!(alert.rules.is_empty());
        assert_eq!(alert.risk_level, RiskLevel::Low);
        assert_eq!(engine.gas_window().len(), 1);
    }

    #[tokio::test]
    async fn missing_gas_price_is_not_recorded() {
        let engine = DetectionEngine::new(DetectorConfig::default(), None);
        let t = PendingTransaction::new(H256::zero(), Address::zero(), None);
        let alert = engine.analyze(&t).await;
        assert_eq!(alert.confidence, 10);
        assert!(engine.gas_window().is_empty());
        assert_eq!(alert.payload.analysis.fallback_reason(), Some(&FallbackReason::NotRouter));
    }

    #[test]
    fn timeout_errors_map_to_timeout_reason() {
        let r = stage_error(AnalysisStage::Reserves, Error::TimeoutError("x".into()));
        assert_eq!(r, FallbackReason::Timeout { stage: AnalysisStage::Reserves });
        let r = stage_error(AnalysisStage::Resolve, Error::RpcError("x".into()));
        assert!(matches!(r, FallbackReason::OracleError { stage: AnalysisStage::Resolve, .. }));
    }

    #[test]
    fn clock_can_be_replaced() {
        let clock = Arc::new(ManualClock::new(42));
        let engine = DetectionEngine::new(DetectorConfig::default(), None).with_clock(clock);
        assert_eq!(engine.clock.now_ms(), 42);
        assert!(!engine.has_oracle());
    }
}
