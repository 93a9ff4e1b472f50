use chrono::{DateTime, Utc};
use ethereum_types::{Address, H256};
use sentinela_core::types::{PendingTransaction, RiskLevel};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{AnalysisOutcome, EnhancedData},
    risk::{LossEstimate, RiskAssessment, RiskRule},
};

/// Transação original e o resultado da análise enriquecida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub transaction: PendingTransaction,
    pub analysis: AnalysisOutcome,
}

/// Classificação de risco de uma transação pendente.
///
/// Criado uma vez por transação analisada e entregue ao [`AlertSink`](crate::traits::AlertSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub tx_hash: H256,
    pub from: Address,
    pub to: Option<Address>,
    pub risk_level: RiskLevel,
    pub confidence: u8,
    pub rules: Vec<RiskRule>,
    pub est_loss_usd: f64,
    pub slippage_pct: f64,
    pub payload: AlertPayload,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        transaction: PendingTransaction,
        assessment: RiskAssessment,
        loss: LossEstimate,
        analysis: AnalysisOutcome,
    ) -> Self {
        Self {
            tx_hash: transaction.hash,
            from: transaction.from,
            to: transaction.to,
            risk_level: assessment.level,
            confidence: assessment.confidence,
            rules: assessment.rules,
            est_loss_usd: loss.est_loss_usd,
            slippage_pct: loss.slippage_pct,
            payload: AlertPayload { transaction, analysis },
            created_at: Utc::now(),
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(RiskRule::name).collect()
    }

    pub fn has_rule(&self, rule: RiskRule) -> bool {
        self.rules.contains(&rule)
    }

    pub fn enhanced(&self) -> Option<&EnhancedData> {
        self.payload.analysis.enhanced()
    }
}
