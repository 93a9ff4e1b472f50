use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use ethers::abi::{encode, AbiParser, Token};
use sentinela_core::error::{Error, Result};
use sentinela_core::traits::RpcProvider;
use sentinela_core::types::PendingTransaction;
use sentinela_detector::{
    DetectionEngine, DetectorConfig, LiquidityOracle, RpcLiquidityOracle, SwapFunction,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Node simulado com um único par V2 (token0 = 0x0a.., token1 = 0x0b..).
struct FakeNode {
    factory: Address,
    pair: Address,
    reserves: (U256, U256),
    delay: Option<Duration>,
    broken: bool,
    calls: AtomicUsize,
}

impl FakeNode {
    fn healthy() -> Self {
        Self {
            factory: DetectorConfig::default().factories["uniswapV2"],
            pair: Address::repeat_byte(0x77),
            reserves: (U256::from(1_000_000u64), U256::from(1_000_000u64)),
            delay: None,
            broken: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn broken() -> Self {
        Self { broken: true, ..Self::healthy() }
    }
}

#[async_trait]
impl RpcProvider for FakeNode {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.broken {
            return Err(Error::RpcError("connection refused".into()));
        }
        let selector = hex::encode(&data[..4]);
        match selector.as_str() {
            "e6a43905" if to == self.factory => Ok(encode(&[Token::Address(self.pair)])),
            "0902f1ac" if to == self.pair => Ok(encode(&[
                Token::Uint(self.reserves.0),
                Token::Uint(self.reserves.1),
                Token::Uint(U256::from(1_700_000_000u64)),
            ])),
            "0dfe1681" if to == self.pair => Ok(encode(&[Token::Address(Address::repeat_byte(0x0a))])),
            "d21220a7" if to == self.pair => Ok(encode(&[Token::Address(Address::repeat_byte(0x0b))])),
            // contrato inexistente: retorno vazio
            _ => Ok(Vec::new()),
        }
    }

    async fn get_block_number(&self) -> Result<u64> {
        Ok(18_000_000)
    }
}

#[tokio::test]
async fn fallback_provider_serves_when_primary_fails() {
    let oracle = RpcLiquidityOracle::with_fallback(FakeNode::broken(), FakeNode::healthy());
    let factory = DetectorConfig::default().factories["uniswapV2"];
    let pair = oracle
        .resolve_pair(factory, Address::repeat_byte(0x0a), Address::repeat_byte(0x0b))
        .await
        .unwrap();
    assert_eq!(pair, Some(Address::repeat_byte(0x77)));
}

#[tokio::test]
async fn primary_failure_without_fallback_is_an_error() {
    let oracle = RpcLiquidityOracle::new(FakeNode::broken());
    let err = oracle
        .get_reserves(Address::repeat_byte(0x77), Address::repeat_byte(0x0a))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RpcError(_)));
}

#[tokio::test]
async fn slow_node_times_out() {
    let node = FakeNode {
        delay: Some(Duration::from_millis(300)),
        ..FakeNode::healthy()
    };
    let oracle = RpcLiquidityOracle::new(node).with_call_timeout(Duration::from_millis(20));
    let err = oracle
        .get_reserves(Address::repeat_byte(0x77), Address::repeat_byte(0x0a))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn empty_response_is_a_decode_error() {
    let oracle = RpcLiquidityOracle::new(FakeNode::healthy());
    // factory desconhecida: o node devolve vazio
    let err = oracle
        .resolve_pair(Address::repeat_byte(0xee), Address::repeat_byte(0x0a), Address::repeat_byte(0x0b))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DecodeError(_)));
}

#[tokio::test]
async fn engine_reads_reserves_through_rpc() {
    let oracle: Arc<dyn LiquidityOracle> = Arc::new(RpcLiquidityOracle::new(FakeNode::healthy()));
    let engine = DetectionEngine::new(DetectorConfig::default(), Some(oracle));

    let swap = AbiParser::default()
        .parse_function(SwapFunction::SwapExactTokensForTokens.signature())
        .unwrap();
    let input = swap
        .encode_input(&[
            Token::Uint(U256::from(10_000u64)),
            Token::Uint(U256::from(9_000u64)),
            Token::Array(vec![
                Token::Address(Address::repeat_byte(0x0a)),
                Token::Address(Address::repeat_byte(0x0b)),
            ]),
            Token::Address(Address::repeat_byte(0x99)),
            Token::Uint(U256::from(1u64)),
        ])
        .unwrap();
    let router = DetectorConfig::default().known_routers[0].address;
    let tx = PendingTransaction::new(H256::repeat_byte(0x42), Address::repeat_byte(0x01), Some(router))
        .with_gas_price(U256::from(30_000_000_000u64))
        .with_input(input);

    let alert = engine.analyze(&tx).await;
    assert_eq!(
        alert.rule_names(),
        vec!["isDexRouter", "largeRelativeSize", "highPriceImpact"]
    );
    assert_eq!(alert.confidence, 85);
    let data = alert.enhanced().unwrap();
    assert_eq!(data.pair, Address::repeat_byte(0x77));
    assert_eq!(data.impact.amount_out, U256::from(9_871u64));
}
