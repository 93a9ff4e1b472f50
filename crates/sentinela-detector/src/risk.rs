use sentinela_core::types::RiskLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{analysis::EnhancedData, config::Thresholds};

/// Confiança inicial de toda análise.
pub const BASE_CONFIDENCE: u8 = 10;
/// Teto de confiança quando houve dados on-chain.
pub const ENHANCED_CONFIDENCE_CAP: u8 = 100;
/// Teto de confiança no modo básico.
pub const BASIC_CONFIDENCE_CAP: u8 = 95;

/// Regras da matriz de risco, na ordem em que são avaliadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskRule {
    #[serde(rename = "isDexRouter")]
    IsDexRouter,
    #[serde(rename = "largeRelativeSize")]
    LargeRelativeSize,
    #[serde(rename = "highPriceImpact")]
    HighPriceImpact,
    #[serde(rename = "correlatedSequence")]
    CorrelatedSequence,
    #[serde(rename = "gasPriceSpike")]
    GasPriceSpike,
}

impl RiskRule {
    pub fn name(&self) -> &'static str {
        match self {
            RiskRule::IsDexRouter => "isDexRouter",
            RiskRule::LargeRelativeSize => "largeRelativeSize",
            RiskRule::HighPriceImpact => "highPriceImpact",
            RiskRule::CorrelatedSequence => "correlatedSequence",
            RiskRule::GasPriceSpike => "gasPriceSpike",
        }
    }

    pub fn confidence_delta(&self) -> u8 {
        match self {
            RiskRule::IsDexRouter => 30,
            RiskRule::LargeRelativeSize => 25,
            RiskRule::HighPriceImpact => 20,
            RiskRule::CorrelatedSequence => 30,
            RiskRule::GasPriceSpike => 45,
        }
    }

    pub fn level_floor(&self) -> RiskLevel {
        match self {
            RiskRule::IsDexRouter => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

impl fmt::Display for RiskRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sinais coletados para uma transação.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskSignals {
    pub is_dex_router: bool,
    pub enhanced: Option<EnhancedSignals>,
    /// Preço de gás da transação, quando informado
    pub gas_price: Option<f64>,
    /// Mediana da janela já incluindo a amostra da transação
    pub gas_median: f64,
}

/// Sinais disponíveis apenas com dados on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnhancedSignals {
    pub relative_size_pct: f64,
    pub price_impact_pct: f64,
    pub correlated_sequence: bool,
}

impl From<&EnhancedData> for EnhancedSignals {
    fn from(data: &EnhancedData) -> Self {
        Self {
            relative_size_pct: data.impact.relative_size_pct,
            price_impact_pct: data.impact.price_impact_pct,
            correlated_sequence: data.is_sandwich(),
        }
    }
}

/// Nível, confiança e regras disparadas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub confidence: u8,
    pub rules: Vec<RiskRule>,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            level: RiskLevel::Low,
            confidence: BASE_CONFIDENCE,
            rules: Vec::new(),
        }
    }
}

impl RiskAssessment {
    /// Aplica uma regra: a confiança só cresce e o nível só escala.
    pub fn apply(&mut self, rule: RiskRule) {
        self.rules.push(rule);
        self.confidence = self.confidence.saturating_add(rule.confidence_delta());
        self.level = self.level.max(rule.level_floor());
    }

    pub fn has_rule(&self, rule: RiskRule) -> bool {
        self.rules.contains(&rule)
    }

    fn clamp(mut self, cap: u8) -> Self {
        self.confidence = self.confidence.min(cap);
        self
    }
}

/// Estimativa grosseira de perda e slippage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossEstimate {
    pub est_loss_usd: f64,
    pub slippage_pct: f64,
}

/// Matriz de regras; sem estado entre invocações.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    thresholds: Thresholds,
}

impl RiskScorer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn score(&self, signals: &RiskSignals) -> RiskAssessment {
        let mut assessment = RiskAssessment::default();

        if signals.is_dex_router {
            assessment.apply(RiskRule::IsDexRouter);
        }

        if let Some(enhanced) = signals.enhanced {
            if enhanced.relative_size_pct > self.thresholds.large_relative_size_pct {
                assessment.apply(RiskRule::LargeRelativeSize);
            }
            if enhanced.price_impact_pct > self.thresholds.high_price_impact_pct {
                assessment.apply(RiskRule::HighPriceImpact);
            }
            if enhanced.correlated_sequence {
                assessment.apply(RiskRule::CorrelatedSequence);
            }
        }

        if let Some(gas_price) = signals.gas_price {
            if self.is_gas_spike(gas_price, signals.gas_median) {
                assessment.apply(RiskRule::GasPriceSpike);
            }
        }

        let cap = if signals.enhanced.is_some() {
            ENHANCED_CONFIDENCE_CAP
        } else {
            BASIC_CONFIDENCE_CAP
        };
        assessment.clamp(cap)
    }

    /// Preço zero nunca é pico; mediana zero cai para o próprio preço.
    pub fn is_gas_spike(&self, gas_price: f64, median: f64) -> bool {
        if !(gas_price > 0.0) {
            return false;
        }
        let reference = if median > 0.0 { median } else { gas_price };
        gas_price > reference * self.thresholds.gas_spike_multiplier
    }

    /// Perda e slippage estimadas: a partir do impacto quando há dados
    /// on-chain, senão valores fixos pelas regras disparadas.
    pub fn estimate_loss(&self, assessment: &RiskAssessment, enhanced: Option<&EnhancedData>) -> LossEstimate {
        match enhanced {
            Some(data) => {
                let impact = data.impact.price_impact_pct;
                LossEstimate {
                    est_loss_usd: if impact > 1.0 { impact * 5.0 } else { 0.0 },
                    slippage_pct: impact,
                }
            }
            None if assessment.has_rule(RiskRule::GasPriceSpike) => LossEstimate {
                est_loss_usd: 10.0,
                slippage_pct: 1.8,
            },
            None if assessment.has_rule(RiskRule::IsDexRouter) => LossEstimate {
                est_loss_usd: 2.5,
                slippage_pct: 0.4,
            },
            None => LossEstimate::default(),
        }
    }
}
