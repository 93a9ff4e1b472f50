use async_trait::async_trait;
use ethereum_types::{Address, U256};
use ethers::abi::{AbiParser, Function, Token};
use sentinela_core::{
    error::{Error, Result},
    traits::RpcProvider,
    utils::with_timeout,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::traits::LiquidityOracle;

const GET_PAIR_SIG: &str = "getPair(address,address) view returns (address)";
const GET_RESERVES_SIG: &str = "getReserves() returns (uint112,uint112,uint32)";
const TOKEN0_SIG: &str = "token0() view returns (address)";
const TOKEN1_SIG: &str = "token1() view returns (address)";

/// Prazo padrão de cada leitura on-chain.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Reservas de um par V2, orientadas em relação ao token de entrada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolReserves {
    pub pair: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
    pub reserve_in: U256,
    pub reserve_out: U256,
}

impl PoolReserves {
    /// Orienta as reservas para `token_in`; `None` se o token não pertence ao par.
    pub fn orient(
        pair: Address,
        token0: Address,
        token1: Address,
        reserve0: U256,
        reserve1: U256,
        token_in: Address,
    ) -> Option<Self> {
        let (reserve_in, reserve_out) = if token_in == token0 {
            (reserve0, reserve1)
        } else if token_in == token1 {
            (reserve1, reserve0)
        } else {
            return None;
        };
        Some(Self {
            pair,
            token0,
            token1,
            reserve0,
            reserve1,
            reserve_in,
            reserve_out,
        })
    }
}

/// [`LiquidityOracle`] sobre chamadas `eth_call` a factories e pares V2.
///
/// Não há cache: cada análise lê o estado mais recente do node. Quando um
/// provedor de fallback é configurado, ele é consultado após qualquer falha
/// do primário.
pub struct RpcLiquidityOracle<P> {
    primary: P,
    fallback: Option<P>,
    call_timeout: Duration,
}

impl<P: RpcProvider + Send + Sync> RpcLiquidityOracle<P> {
    /// Cria um oráculo apenas com provedor primário.
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            fallback: None,
            call_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    /// Define provedor de fallback.
    pub fn with_fallback(primary: P, fallback: P) -> Self {
        Self {
            primary,
            fallback: Some(fallback),
            call_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    async fn call_inner(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        match with_timeout(self.call_timeout, "eth_call", self.primary.call(to, data.clone())).await {
            Ok(out) => Ok(out),
            Err(e) => match self.fallback {
                Some(ref fb) => {
                    debug!(target_addr = ?to, error = %e, "primário falhou, usando fallback");
                    with_timeout(self.call_timeout, "eth_call (fallback)", fb.call(to, data)).await
                }
                None => Err(e),
            },
        }
    }

    async fn invoke(&self, signature: &str, to: Address, args: &[Token]) -> Result<Vec<Token>> {
        let abi = parse(signature)?;
        let data = abi
            .encode_input(args)
            .map_err(|e| Error::DecodeError(format!("falha ao codificar {}: {}", abi.name, e)))?;
        let out = self.call_inner(to, data).await?;
        abi.decode_output(&out)
            .map_err(|e| Error::DecodeError(format!("resposta inválida de {}: {}", abi.name, e)))
    }

    async fn read_address(&self, signature: &str, to: Address) -> Result<Address> {
        let tokens = self.invoke(signature, to, &[]).await?;
        first_address(&tokens)
    }

    async fn read_reserves(&self, pair: Address) -> Result<(U256, U256)> {
        let tokens = self.invoke(GET_RESERVES_SIG, pair, &[]).await?;
        let r0 = tokens.first().cloned().and_then(Token::into_uint);
        let r1 = tokens.get(1).cloned().and_then(Token::into_uint);
        match (r0, r1) {
            (Some(r0), Some(r1)) => Ok((r0, r1)),
            _ => Err(Error::DecodeError("getReserves sem reservas".into())),
        }
    }
}

fn parse(signature: &str) -> Result<Function> {
    AbiParser::default()
        .parse_function(signature)
        .map_err(|e| Error::DecodeError(format!("assinatura inválida {}: {}", signature, e)))
}

fn first_address(tokens: &[Token]) -> Result<Address> {
    tokens
        .first()
        .cloned()
        .and_then(Token::into_address)
        .ok_or_else(|| Error::DecodeError("resposta sem endereço".into()))
}

#[async_trait]
impl<P> LiquidityOracle for RpcLiquidityOracle<P>
where
    P: RpcProvider + Send + Sync,
{
    async fn resolve_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>> {
        let tokens = self
            .invoke(
                GET_PAIR_SIG,
                factory,
                &[Token::Address(token_a), Token::Address(token_b)],
            )
            .await
            .map_err(|e| {
                warn!(factory = ?factory, error = %e, "getPair falhou");
                e
            })?;
        let pair = first_address(&tokens)?;
        if pair.is_zero() {
            debug!(factory = ?factory, token_a = ?token_a, token_b = ?token_b, "par inexistente");
            return Ok(None);
        }
        Ok(Some(pair))
    }

    async fn get_reserves(&self, pair: Address, token_in: Address) -> Result<Option<PoolReserves>> {
        let (reserves, token0, token1) = tokio::try_join!(
            self.read_reserves(pair),
            self.read_address(TOKEN0_SIG, pair),
            self.read_address(TOKEN1_SIG, pair),
        )
        .map_err(|e| {
            warn!(pair = ?pair, error = %e, "leitura de reservas falhou");
            e
        })?;
        let oriented = PoolReserves::orient(pair, token0, token1, reserves.0, reserves.1, token_in);
        if oriented.is_none() {
            debug!(pair = ?pair, token_in = ?token_in, "token de entrada fora do par");
        }
        Ok(oriented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::encode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct PairProvider {
        pair: Address,
        token0: Address,
        token1: Address,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RpcProvider for PairProvider {
        async fn call(&self, _to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &data[..4] {
                // getPair
                [0xe6, 0xa4, 0x39, 0x05] => Ok(encode(&[Token::Address(self.pair)])),
                // getReserves
                [0x09, 0x02, 0xf1, 0xac] => Ok(encode(&[
                    Token::Uint(U256::from(100u64)),
                    Token::Uint(U256::from(300u64)),
                    Token::Uint(U256::from(1u64)),
                ])),
                // token0
                [0x0d, 0xfe, 0x16, 0x81] => Ok(encode(&[Token::Address(self.token0)])),
                // token1
                [0xd2, 0x12, 0x20, 0xa7] => Ok(encode(&[Token::Address(self.token1)])),
                _ => Err(Error::RpcError("seletor desconhecido".into())),
            }
        }

        async fn get_block_number(&self) -> Result<u64> {
            Ok(1)
        }
    }

    fn provider() -> PairProvider {
        PairProvider {
            pair: Address::repeat_byte(0x77),
            token0: Address::repeat_byte(0x0a),
            token1: Address::repeat_byte(0x0b),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn resolves_pair_address() {
        let oracle = RpcLiquidityOracle::new(provider());
        let pair = oracle
            .resolve_pair(Address::repeat_byte(0xf0), Address::repeat_byte(0x0a), Address::repeat_byte(0x0b))
            .await
            .unwrap();
        assert_eq!(pair, Some(Address::repeat_byte(0x77)));
    }

    #[tokio::test]
    async fn zero_pair_is_absent() {
        let oracle = RpcLiquidityOracle::new(PairProvider::default());
        let pair = oracle
            .resolve_pair(Address::repeat_byte(0xf0), Address::repeat_byte(0x0a), Address::repeat_byte(0x0b))
            .await
            .unwrap();
        assert_eq!(pair, None);
    }

    #[tokio::test]
    async fn reserves_are_oriented_to_token_in() {
        let oracle = RpcLiquidityOracle::new(provider());
        let pair = Address::repeat_byte(0x77);

        let r = oracle.get_reserves(pair, Address::repeat_byte(0x0a)).await.unwrap().unwrap();
        assert_eq!(r.reserve_in, U256::from(100u64));
        assert_eq!(r.reserve_out, U256::from(300u64));

        let r = oracle.get_reserves(pair, Address::repeat_byte(0x0b)).await.unwrap().unwrap();
        assert_eq!(r.reserve_in, U256::from(300u64));
        assert_eq!(r.reserve_out, U256::from(100u64));
        assert_eq!(r.reserve0, U256::from(100u64));
        assert_eq!(r.token1, Address::repeat_byte(0x0b));
    }

    #[tokio::test]
    async fn foreign_token_is_absent() {
        let oracle = RpcLiquidityOracle::new(provider());
        let r = oracle
            .get_reserves(Address::repeat_byte(0x77), Address::repeat_byte(0xcc))
            .await
            .unwrap();
        assert!(r.is_none());
    }

    #[tokio::test]
    async fn reserves_are_read_on_every_call() {
        let oracle = RpcLiquidityOracle::new(provider());
        let pair = Address::repeat_byte(0x77);
        oracle.get_reserves(pair, Address::repeat_byte(0x0a)).await.unwrap();
        oracle.get_reserves(pair, Address::repeat_byte(0x0a)).await.unwrap();
        assert_eq!(oracle.primary.calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn orient_rejects_unknown_token() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        assert!(PoolReserves::orient(a, a, b, U256::one(), U256::one(), Address::repeat_byte(3)).is_none());
    }
}
