/*!
 * Sentinela Traits
 * 
 * Traits comuns usados em toda a workspace Sentinela
 */

use async_trait::async_trait;
use crate::error::Result;
use crate::types::PendingTransaction;
use ethereum_types::Address;
use tokio::sync::mpsc;

/// Trait para provedores RPC
#[async_trait]
pub trait RpcProvider: Send + Sync {
    /// Chama um método de contrato (`eth_call`)
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>>;

    /// Obtém o número do bloco atual
    async fn get_block_number(&self) -> Result<u64>;
}

/// Fonte de transações pendentes com semântica de inscrição.
///
/// `stream` entrega cada transação observada em `sink` e só retorna quando a
/// inscrição termina. Um `Err` indica desconexão; o chamador decide se
/// reconecta.
#[async_trait]
pub trait PendingTransactionSource: Send + Sync {
    async fn stream(&self, sink: mpsc::Sender<PendingTransaction>) -> Result<()>;
}
