/*!
 * Sentinela Types
 * 
 * Tipos comuns usados em toda a workspace Sentinela
 */

use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alias para hash de transação
pub type TransactionHash = H256;

/// Transação observada na mempool, ainda não minerada.
///
/// Imutável depois de observada. `to` é `None` para criação de contrato e
/// `gas_price` é `None` quando o node não informa o preço (EIP-1559 sem
/// `gasPrice` legado).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: TransactionHash,
    pub from: Address,
    pub to: Option<Address>,
    pub gas_price: Option<U256>,
    pub value: U256,
    pub input: Vec<u8>,
}

impl PendingTransaction {
    /// Cria uma transação com valor zero e sem calldata.
    pub fn new(hash: TransactionHash, from: Address, to: Option<Address>) -> Self {
        Self {
            hash,
            from,
            to,
            gas_price: None,
            value: U256::zero(),
            input: Vec::new(),
        }
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_input(mut self, input: Vec<u8>) -> Self {
        self.input = input;
        self
    }
}

/// Nível de risco atribuído a uma transação.
///
/// A ordenação segue a severidade, permitindo escalonar com `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Low
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}
