use ethereum_types::Address;
use sentinela_core::{
    error::{Error, Result},
    utils::hex_to_address,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::{gas_window::DEFAULT_GAS_WINDOW_CAPACITY, sandwich_buffer::DEFAULT_BUFFER_CAPACITY};

/// Variável com a URL websocket do node (obrigatória).
pub const WS_URL_ENV: &str = "SENTINELA_WS_URL";
/// Variável com a URL HTTP usada pelo oráculo (opcional).
pub const HTTP_URL_ENV: &str = "SENTINELA_HTTP_URL";

/// Limiares ajustáveis da matriz de risco.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    #[serde(rename = "largeRelativeSize")]
    pub large_relative_size_pct: f64,
    #[serde(rename = "highPriceImpact")]
    pub high_price_impact_pct: f64,
    #[serde(rename = "gasSpikeMultiplier")]
    pub gas_spike_multiplier: f64,
    #[serde(rename = "sandwichWindowMs")]
    pub sandwich_window_ms: u64,
    #[serde(rename = "gasWindowCapacity")]
    pub gas_window_capacity: usize,
    #[serde(rename = "bufferCapacity")]
    pub buffer_capacity: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            large_relative_size_pct: 0.5,
            high_price_impact_pct: 1.0,
            gas_spike_multiplier: 1.6,
            sandwich_window_ms: 30_000,
            gas_window_capacity: DEFAULT_GAS_WINDOW_CAPACITY,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Router conhecido e, opcionalmente, a DEX cuja factory ele usa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterEntry {
    pub address: Address,
    #[serde(default)]
    pub dex: Option<String>,
}

/// Configuração do motor de detecção.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectorConfig {
    pub known_routers: Vec<RouterEntry>,
    /// Nome da DEX -> endereço da factory
    pub factories: BTreeMap<String, Address>,
    /// DEX usada para routers sem mapeamento próprio
    pub default_dex: String,
    pub thresholds: Thresholds,
    pub oracle_timeout_ms: u64,
    pub analysis_timeout_ms: u64,
    pub max_concurrent_analyses: usize,
    pub feed_retry_delay_ms: u64,
    pub alert_min_confidence: u8,
}

const DEFAULT_ROUTERS: &[(&str, Option<&str>)] = &[
    // uniswap v2 router (mainnet)
    ("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", Some("uniswapV2")),
    // uniswap v3 router
    ("0xe592427a0aece92de3edee1f18e0157c05861564", None),
    // pancakeswap router v2 (BSC)
    ("0x10ed43c718714eb63d5aa57b78b54704e256024e", Some("pancakeswap")),
];

const DEFAULT_FACTORIES: &[(&str, &str)] = &[
    ("uniswapV2", "0x5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f"),
    ("sushiswap", "0xc0aee478e3658e2610c5f7a4a2e1777ce9e4f2ac"),
    ("pancakeswap", "0xbcfccbde45ce874adcb698cc183debcf17952812"),
];

impl Default for DetectorConfig {
    fn default() -> Self {
        let known_routers = DEFAULT_ROUTERS
            .iter()
            .filter_map(|(addr, dex)| {
                hex_to_address(addr).map(|address| RouterEntry {
                    address,
                    dex: dex.map(str::to_string),
                })
            })
            .collect();
        let factories = DEFAULT_FACTORIES
            .iter()
            .filter_map(|(name, addr)| hex_to_address(addr).map(|a| (name.to_string(), a)))
            .collect();
        Self {
            known_routers,
            factories,
            default_dex: "uniswapV2".to_string(),
            thresholds: Thresholds::default(),
            oracle_timeout_ms: 3_000,
            analysis_timeout_ms: 10_000,
            max_concurrent_analyses: 512,
            feed_retry_delay_ms: 5_000,
            alert_min_confidence: 70,
        }
    }
}

impl DetectorConfig {
    /// Carrega a configuração a partir de JSON; campos ausentes usam o padrão.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::ConfigurationError(format!("JSON de configuração inválido: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigurationError(format!("falha ao ler {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if t.gas_window_capacity == 0 || t.buffer_capacity == 0 {
            return Err(Error::ConfigurationError("capacidades devem ser maiores que zero".into()));
        }
        if !(t.gas_spike_multiplier > 0.0) {
            return Err(Error::ConfigurationError("gasSpikeMultiplier deve ser positivo".into()));
        }
        if t.large_relative_size_pct < 0.0 || t.high_price_impact_pct < 0.0 {
            return Err(Error::ConfigurationError("limiares percentuais não podem ser negativos".into()));
        }
        if self.max_concurrent_analyses == 0 {
            return Err(Error::ConfigurationError("maxConcurrentAnalyses deve ser maior que zero".into()));
        }
        if self.oracle_timeout_ms == 0 || self.analysis_timeout_ms == 0 {
            return Err(Error::ConfigurationError("timeouts devem ser maiores que zero".into()));
        }
        if self.alert_min_confidence > 100 {
            return Err(Error::ConfigurationError("alertMinConfidence acima de 100".into()));
        }
        if !self.factories.contains_key(&self.default_dex) {
            return Err(Error::ConfigurationError(format!(
                "defaultDex {} sem factory configurada",
                self.default_dex
            )));
        }
        Ok(())
    }

    pub fn is_known_router(&self, address: &Address) -> bool {
        self.known_routers.iter().any(|r| &r.address == address)
    }

    /// Factory usada para resolver pares de swaps enviados a `router`.
    pub fn factory_for_router(&self, router: &Address) -> Option<Address> {
        let entry = self.known_routers.iter().find(|r| &r.address == router)?;
        let dex = entry.dex.as_deref().unwrap_or(&self.default_dex);
        self.factories.get(dex).copied()
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.analysis_timeout_ms)
    }

    pub fn feed_retry_delay(&self) -> Duration {
        Duration::from_millis(self.feed_retry_delay_ms)
    }
}

/// Endpoints do node lidos do ambiente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub ws_url: String,
    /// Sem URL HTTP o motor roda apenas no modo básico
    pub http_url: Option<String>,
}

impl EndpointConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let ws_url = non_empty(WS_URL_ENV)
            .ok_or_else(|| Error::ConfigurationError(format!("{} não definida", WS_URL_ENV)))?;
        Ok(Self {
            ws_url,
            http_url: non_empty(HTTP_URL_ENV),
        })
    }
}
