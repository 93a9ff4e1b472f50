/*!
 * Sentinela RPC
 *
 * Cliente RPC para interação com nodes Ethereum e feed de transações
 * pendentes da mempool.
 */

mod feed;

pub use feed::*;

use sentinela_core::{Error, error::Result, utils::with_timeout};
use ethereum_types::Address;
use web3::{
    Web3,
    transports::{Http, WebSocket},
    types::{Bytes, H160},
};
use std::time::Duration;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Configuração do cliente RPC
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8545".to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Enum para diferentes tipos de transporte
pub enum TransportType {
    Http(Web3<Http>),
    WebSocket(Web3<WebSocket>),
}

/// Cliente RPC para Ethereum
///
/// Não mantém cache: leituras de estado on-chain precisam refletir o bloco
/// mais recente.
pub struct SentinelaRpcClient {
    transport: TransportType,
    config: RpcConfig,
}

impl SentinelaRpcClient {
    /// Cria um novo cliente RPC HTTP
    pub async fn new_http(config: RpcConfig) -> Result<Self> {
        let transport = Http::new(&config.endpoint)
            .map_err(|e| Error::RpcError(format!("Falha ao conectar via HTTP: {}", e)))?;

        let client = Self {
            transport: TransportType::Http(Web3::new(transport)),
            config,
        };

        // Verifica a conexão
        client.block_number_once().await?;
        Ok(client)
    }

    /// Cria um novo cliente RPC WebSocket
    pub async fn new_websocket(config: RpcConfig) -> Result<Self> {
        let transport = WebSocket::new(&config.endpoint)
            .await
            .map_err(|e| Error::RpcError(format!("Falha ao conectar via WebSocket: {}", e)))?;

        let client = Self {
            transport: TransportType::WebSocket(Web3::new(transport)),
            config,
        };

        // Verifica a conexão
        client.block_number_once().await?;
        Ok(client)
    }

    /// Cria um novo cliente baseado na URL
    pub async fn new(config: RpcConfig) -> Result<Self> {
        if config.endpoint.starts_with("ws") {
            Self::new_websocket(config).await
        } else {
            Self::new_http(config).await
        }
    }

    /// Configuração em uso
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    async fn block_number_once(&self) -> Result<u64> {
        let fut = async {
            let block_number = match &self.transport {
                TransportType::Http(web3) => web3.eth().block_number().await,
                TransportType::WebSocket(web3) => web3.eth().block_number().await,
            }
            .map_err(|e| Error::RpcError(format!("Falha ao obter número do bloco: {}", e)))?;
            Ok(block_number.as_u64())
        };
        with_timeout(self.config.timeout, "eth_blockNumber", fut).await
    }

    async fn call_once(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let call_request = web3::types::CallRequest {
            from: None,
            to: Some(H160::from_slice(to.as_bytes())),
            gas: None,
            gas_price: None,
            value: None,
            data: Some(Bytes(data.to_vec())),
            transaction_type: None,
            access_list: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        };

        let fut = async {
            let result = match &self.transport {
                TransportType::Http(web3) => web3.eth().call(call_request, None).await,
                TransportType::WebSocket(web3) => web3.eth().call(call_request, None).await,
            }
            .map_err(|e| Error::RpcError(format!("Falha na chamada RPC: {}", e)))?;
            Ok(result.0)
        };
        with_timeout(self.config.timeout, "eth_call", fut).await
    }
}

/// Implementação da trait RpcProvider do sentinela-core
#[async_trait]
impl sentinela_core::traits::RpcProvider for SentinelaRpcClient {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self.call_once(to, &data).await {
                Ok(out) => return Ok(out),
                // Timeouts não são repetidos: o prazo total pertence ao chamador.
                Err(e) if e.is_timeout() => return Err(e),
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    debug!(target_addr = ?to, attempt, error = %e, "repetindo eth_call");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    warn!(target_addr = ?to, error = %e, "eth_call falhou");
                    return Err(e);
                }
            }
        }
    }

    async fn get_block_number(&self) -> Result<u64> {
        self.block_number_once().await
    }
}
