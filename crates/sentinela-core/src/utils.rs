/*!
 * Sentinela Utils
 * 
 * Utilitários comuns usados em toda a workspace Sentinela
 */

use crate::error::{Error, Result};
use ethereum_types::{Address, H256, U256};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

/// Converte uma string hexadecimal para Address
pub fn hex_to_address(hex: &str) -> Option<Address> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    Address::from_str(hex_str).ok()
}

/// Converte uma string hexadecimal para H256
pub fn hex_to_h256(hex: &str) -> Option<H256> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    H256::from_str(hex_str).ok()
}

/// Formata um Address para exibição (sempre minúsculo)
pub fn format_address(address: &Address) -> String {
    format!("0x{:x}", address)
}

/// Formata um H256 para exibição
pub fn format_h256(hash: &H256) -> String {
    format!("0x{:x}", hash)
}

/// Converte um U256 para f64, saturando em valores fora da faixa.
pub fn u256_to_f64(value: &U256) -> f64 {
    if value.bits() <= 128 {
        value.low_u128() as f64
    } else {
        value.to_string().parse::<f64>().unwrap_or(f64::MAX)
    }
}

/// Executa `fut` com prazo máximo, convertendo o estouro em [`Error::TimeoutError`].
pub async fn with_timeout<T, F>(limit: Duration, label: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(Error::TimeoutError(format!(
            "{} excedeu {} ms",
            label,
            limit.as_millis()
        ))),
    }
}
