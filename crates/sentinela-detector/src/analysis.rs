use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{decoder::DecodedSwap, impact::ImpactResult, sandwich_buffer::SandwichMatch};

/// Dados on-chain obtidos para um swap em router conhecido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedData {
    pub swap: DecodedSwap,
    pub token_in: Address,
    pub token_out: Address,
    pub pair: Address,
    pub reserve_in: U256,
    pub reserve_out: U256,
    pub impact: ImpactResult,
    pub sandwich: Option<SandwichMatch>,
}

impl EnhancedData {
    pub fn is_sandwich(&self) -> bool {
        self.sandwich.is_some()
    }

    #[cfg(test)]
    pub(crate) fn for_tokens(token_in: Address, token_out: Address) -> Self {
        use crate::decoder::{AmountOut, SwapFunction};
        Self {
            swap: DecodedSwap {
                method: SwapFunction::SwapExactTokensForTokens,
                path: vec![token_in, token_out],
                amount_in: U256::zero(),
                amount_out: AmountOut::Min(U256::zero()),
            },
            token_in,
            token_out,
            pair: Address::zero(),
            reserve_in: U256::zero(),
            reserve_out: U256::zero(),
            impact: ImpactResult::default(),
            sandwich: None,
        }
    }
}

/// Etapas do pipeline de uma transação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisStage {
    Received,
    GasRecorded,
    RouterCheck,
    Decode,
    Resolve,
    Reserves,
    Impact,
    SandwichCheck,
    EnhancedAnalysis,
    Scored,
    Emitted,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Motivo pelo qual a análise ficou no modo básico.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum FallbackReason {
    /// Destino não é um router conhecido
    NotRouter,
    /// Motor sem oráculo configurado
    OracleDisabled,
    /// Calldata não é um swap reconhecido
    DecodeMiss,
    ZeroAmountIn,
    /// Router sem factory mapeada
    UnknownFactory,
    PairNotFound,
    TokenNotInPair,
    OracleError { stage: AnalysisStage, message: String },
    Timeout { stage: AnalysisStage },
}

impl FallbackReason {
    /// Ausências esperadas, que não indicam falha de infraestrutura.
    pub fn is_expected(&self) -> bool {
        !matches!(self, FallbackReason::OracleError { .. } | FallbackReason::Timeout { .. })
    }
}

/// Resultado da etapa de análise enriquecida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum AnalysisOutcome {
    Enhanced(EnhancedData),
    Basic { reason: FallbackReason },
}

impl AnalysisOutcome {
    pub fn enhanced(&self) -> Option<&EnhancedData> {
        match self {
            AnalysisOutcome::Enhanced(data) => Some(data),
            AnalysisOutcome::Basic { .. } => None,
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            AnalysisOutcome::Enhanced(_) => None,
            AnalysisOutcome::Basic { reason } => Some(reason),
        }
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhanced().is_some()
    }
}

impl From<FallbackReason> for AnalysisOutcome {
    fn from(reason: FallbackReason) -> Self {
        AnalysisOutcome::Basic { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_outcome_has_no_enhanced_data() {
        let outcome: AnalysisOutcome = FallbackReason::DecodeMiss.into();
        assert!(!outcome.is_enhanced());
        assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::DecodeMiss));
    }

    #[test]
    fn expected_absence_differs_from_failure() {
        assert!(FallbackReason::PairNotFound.is_expected());
        assert!(FallbackReason::NotRouter.is_expected());
        assert!(!FallbackReason::Timeout { stage: AnalysisStage::Reserves }.is_expected());
        assert!(!FallbackReason::OracleError {
            stage: AnalysisStage::Resolve,
            message: "falhou".into()
        }
        .is_expected());
    }

    #[test]
    fn outcome_serializes_with_mode_tag() {
        let outcome: AnalysisOutcome = FallbackReason::Timeout { stage: AnalysisStage::Resolve }.into();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["mode"], "basic");
        assert_eq!(json["reason"]["reason"], "timeout");
        assert_eq!(json["reason"]["stage"], "Resolve");
    }
}
