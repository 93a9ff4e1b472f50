use ethereum_types::{Address, U256};
use ethers::abi::{AbiParser, Function, Token};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Funções de swap suportadas em routers compatíveis com Uniswap V2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapFunction {
    SwapExactTokensForTokens,
    SwapTokensForExactTokens,
    SwapExactETHForTokens,
    SwapTokensForExactETH,
    SwapExactTokensForETH,
    SwapETHForExactTokens,
    SwapExactTokensForTokensSupportingFeeOnTransferTokens,
    SwapExactETHForTokensSupportingFeeOnTransferTokens,
    SwapExactTokensForETHSupportingFeeOnTransferTokens,
}

/// Sentido do valor fixado pelo chamador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapKind {
    /// Entrada exata, saída mínima
    ExactIn,
    /// Saída exata, entrada máxima
    ExactOut,
}

impl SwapFunction {
    pub const ALL: [SwapFunction; 9] = [
        SwapFunction::SwapExactTokensForTokens,
        SwapFunction::SwapTokensForExactTokens,
        SwapFunction::SwapExactETHForTokens,
        SwapFunction::SwapTokensForExactETH,
        SwapFunction::SwapExactTokensForETH,
        SwapFunction::SwapETHForExactTokens,
        SwapFunction::SwapExactTokensForTokensSupportingFeeOnTransferTokens,
        SwapFunction::SwapExactETHForTokensSupportingFeeOnTransferTokens,
        SwapFunction::SwapExactTokensForETHSupportingFeeOnTransferTokens,
    ];

    pub fn signature(&self) -> &'static str {
        match self {
            SwapFunction::SwapExactTokensForTokens => {
                "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapTokensForExactTokens => {
                "swapTokensForExactTokens(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactETHForTokens => {
                "swapExactETHForTokens(uint256,address[],address,uint256)"
            }
            SwapFunction::SwapTokensForExactETH => {
                "swapTokensForExactETH(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactTokensForETH => {
                "swapExactTokensForETH(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapETHForExactTokens => {
                "swapETHForExactTokens(uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactTokensForTokensSupportingFeeOnTransferTokens => {
                "swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactETHForTokensSupportingFeeOnTransferTokens => {
                "swapExactETHForTokensSupportingFeeOnTransferTokens(uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactTokensForETHSupportingFeeOnTransferTokens => {
                "swapExactTokensForETHSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)"
            }
        }
    }

    /// Nome do método como aparece na ABI.
    pub fn name(&self) -> &'static str {
        let sig = self.signature();
        sig.split('(').next().unwrap_or(sig)
    }

    pub fn kind(&self) -> SwapKind {
        match self {
            SwapFunction::SwapTokensForExactTokens
            | SwapFunction::SwapTokensForExactETH
            | SwapFunction::SwapETHForExactTokens => SwapKind::ExactOut,
            _ => SwapKind::ExactIn,
        }
    }

    /// Variantes `payable`: a entrada em ETH vem do `value` da transação.
    pub fn pays_eth(&self) -> bool {
        matches!(
            self,
            SwapFunction::SwapExactETHForTokens
                | SwapFunction::SwapETHForExactTokens
                | SwapFunction::SwapExactETHForTokensSupportingFeeOnTransferTokens
        )
    }
}

/// Limite de saída declarado no calldata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "camelCase")]
pub enum AmountOut {
    Min(U256),
    Exact(U256),
}

impl AmountOut {
    pub fn value(&self) -> U256 {
        match self {
            AmountOut::Min(v) | AmountOut::Exact(v) => *v,
        }
    }
}

/// Intenção de swap extraída do calldata.
///
/// `amount_in` é a entrada exata (exact-in) ou a entrada máxima (exact-out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSwap {
    pub method: SwapFunction,
    pub path: Vec<Address>,
    pub amount_in: U256,
    pub amount_out: AmountOut,
}

impl DecodedSwap {
    pub fn token_in(&self) -> Address {
        self.path.first().copied().unwrap_or_default()
    }

    pub fn token_out(&self) -> Address {
        self.path.last().copied().unwrap_or_default()
    }
}

static SWAP_FUNCTIONS: Lazy<Vec<(SwapFunction, Function)>> = Lazy::new(|| {
    let mut parser = AbiParser::default();
    SwapFunction::ALL
        .iter()
        .filter_map(|func| {
            parser
                .parse_function(func.signature())
                .ok()
                .map(|f| (*func, f))
        })
        .collect()
});

/// Identifica qual função de swap foi invocada
pub fn detect_swap_function(data: &[u8]) -> Option<(SwapFunction, &'static Function)> {
    if data.len() < 4 {
        return None;
    }
    let selector = &data[..4];
    SWAP_FUNCTIONS
        .iter()
        .find(|(_, f)| f.short_signature()[..] == *selector)
        .map(|(func, f)| (*func, f))
}

/// Decodifica o calldata de um router V2.
///
/// `value` é o ETH enviado com a transação, usado como entrada nas variantes
/// `payable`. Retorna `None` para chamadas que não são swaps conhecidos ou
/// cujo caminho tem menos de dois tokens.
pub fn decode_swap(data: &[u8], value: U256) -> Option<DecodedSwap> {
    let (func, abi) = detect_swap_function(data)?;
    let tokens = abi.decode_input(&data[4..]).ok()?;

    let (amount_in, amount_out, path_idx) = match (func.kind(), func.pays_eth()) {
        // (amountOutMin, path, to, deadline)
        (SwapKind::ExactIn, true) => (value, AmountOut::Min(uint_at(&tokens, 0)?), 1),
        // (amountOut, path, to, deadline)
        (SwapKind::ExactOut, true) => (value, AmountOut::Exact(uint_at(&tokens, 0)?), 1),
        // (amountIn, amountOutMin, path, to, deadline)
        (SwapKind::ExactIn, false) => (uint_at(&tokens, 0)?, AmountOut::Min(uint_at(&tokens, 1)?), 2),
        // (amountOut, amountInMax, path, to, deadline)
        (SwapKind::ExactOut, false) => (uint_at(&tokens, 1)?, AmountOut::Exact(uint_at(&tokens, 0)?), 2),
    };

    let path = tokens
        .get(path_idx)?
        .clone()
        .into_array()?
        .into_iter()
        .map(Token::into_address)
        .collect::<Option<Vec<_>>>()?;
    if path.len() < 2 {
        return None;
    }

    Some(DecodedSwap {
        method: func,
        path,
        amount_in,
        amount_out,
    })
}

fn uint_at(tokens: &[Token], idx: usize) -> Option<U256> {
    tokens.get(idx)?.clone().into_uint()
}
