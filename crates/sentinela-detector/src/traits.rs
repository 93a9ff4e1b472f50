use async_trait::async_trait;
use ethereum_types::Address;
use sentinela_core::error::Result;

use crate::{alert::Alert, oracle::PoolReserves};

/// Interface para leitura de liquidez on-chain.
///
/// `Ok(None)` representa ausência esperada (par inexistente, token fora do
/// par); `Err` representa falha de rede ou timeout. Em ambos os casos a
/// análise cai para o modo básico.
#[async_trait]
pub trait LiquidityOracle: Send + Sync {
    /// Resolve o endereço do par `token_a`/`token_b` na `factory`.
    async fn resolve_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>>;

    /// Lê as reservas do par, orientadas em relação a `token_in`.
    async fn get_reserves(&self, pair: Address, token_in: Address) -> Result<Option<PoolReserves>>;
}

/// Destino dos alertas produzidos pelo motor.
///
/// Persistência, filtragem por confiança e broadcast são responsabilidade do
/// implementador; o motor entrega todo alerta produzido.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn emit(&self, alert: Alert) -> Result<()>;
}
