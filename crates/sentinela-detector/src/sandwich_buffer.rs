use ethereum_types::{Address, H256};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::analysis::EnhancedData;

/// Capacidade padrão do buffer de correlação.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Par de tokens sem orientação (menor endereço primeiro).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair(pub Address, pub Address);

impl TokenPair {
    pub fn new(a: Address, b: Address) -> Self {
        if a <= b {
            TokenPair(a, b)
        } else {
            TokenPair(b, a)
        }
    }
}

/// Perna de swap usada na correlação: quem vendeu o quê por o quê.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapLeg {
    pub from: Address,
    pub token_in: Address,
    pub token_out: Address,
}

impl SwapLeg {
    pub fn pair(&self) -> TokenPair {
        TokenPair::new(self.token_in, self.token_out)
    }
}

/// Transação já analisada, mantida para correlação com as seguintes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferedEntry {
    pub hash: H256,
    pub from: Address,
    pub enhanced: Option<EnhancedData>,
    pub timestamp_ms: u64,
}

impl BufferedEntry {
    pub fn leg(&self) -> Option<SwapLeg> {
        self.enhanced.as_ref().map(|e| SwapLeg {
            from: self.from,
            token_in: e.token_in,
            token_out: e.token_out,
        })
    }
}

/// Sequência frontrun → vítima → backrun reconhecida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandwichMatch {
    pub frontrun: H256,
    pub backrun: H256,
    pub attacker: Address,
}

/// Log ordenado e limitado das análises recentes.
///
/// A varredura é sempre da entrada mais antiga para a mais recente e o
/// primeiro casamento vence. Entradas fora da janela de tempo são removidas
/// da cabeça antes de qualquer consulta.
#[derive(Debug)]
pub struct SandwichBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<BufferedEntry>>,
}

impl Default for SandwichBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl SandwichBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Hashes em ordem de inserção.
    pub fn hashes(&self) -> Vec<H256> {
        self.entries.lock().iter().map(|e| e.hash).collect()
    }

    /// Adiciona à cauda, descartando a cabeça acima da capacidade.
    pub fn append(&self, entry: BufferedEntry) {
        let mut entries = self.entries.lock();
        Self::push(&mut entries, self.capacity, entry);
    }

    /// Remove da cabeça as entradas anteriores a `now_ms - window_ms`.
    pub fn evict_older_than(&self, now_ms: u64, window_ms: u64) -> usize {
        let mut entries = self.entries.lock();
        Self::evict(&mut entries, now_ms, window_ms)
    }

    /// Primeira entrada de outro remetente, no mesmo par, que vendeu o token
    /// que o candidato vai receber.
    pub fn find_frontrun(&self, candidate: &SwapLeg) -> Option<BufferedEntry> {
        let entries = self.entries.lock();
        Self::scan_frontrun(&entries, candidate).cloned()
    }

    /// Primeira entrada do mesmo remetente do frontrun, no mesmo par, que
    /// recebe o token de entrada do candidato, posterior ao frontrun.
    pub fn find_backrun(&self, frontrun: &BufferedEntry, candidate: &SwapLeg) -> Option<BufferedEntry> {
        let entries = self.entries.lock();
        Self::scan_backrun(&entries, frontrun, candidate).cloned()
    }

    /// Descarta entradas expiradas e procura um sanduíche em volta do candidato.
    pub fn detect_sandwich(&self, candidate: &SwapLeg, now_ms: u64, window_ms: u64) -> Option<SandwichMatch> {
        let mut entries = self.entries.lock();
        Self::evict(&mut entries, now_ms, window_ms);
        Self::correlate(&entries, candidate)
    }

    /// Expira, correlaciona e registra `entry` sob um único lock.
    ///
    /// O resultado da correlação também é gravado na entrada armazenada.
    pub fn correlate_and_append(&self, mut entry: BufferedEntry, window_ms: u64) -> Option<SandwichMatch> {
        let mut entries = self.entries.lock();
        Self::evict(&mut entries, entry.timestamp_ms, window_ms);
        let found = entry.leg().and_then(|leg| Self::correlate(&entries, &leg));
        if let Some(enhanced) = entry.enhanced.as_mut() {
            enhanced.sandwich = found.clone();
        }
        Self::push(&mut entries, self.capacity, entry);
        found
    }

    fn push(entries: &mut VecDeque<BufferedEntry>, capacity: usize, entry: BufferedEntry) {
        entries.push_back(entry);
        while entries.len() > capacity {
            entries.pop_front();
        }
    }

    fn evict(entries: &mut VecDeque<BufferedEntry>, now_ms: u64, window_ms: u64) -> usize {
        let cutoff = now_ms.saturating_sub(window_ms);
        let mut removed = 0;
        while entries.front().map_or(false, |e| e.timestamp_ms < cutoff) {
            entries.pop_front();
            removed += 1;
        }
        removed
    }

    fn correlate(entries: &VecDeque<BufferedEntry>, candidate: &SwapLeg) -> Option<SandwichMatch> {
        let frontrun = Self::scan_frontrun(entries, candidate)?;
        let backrun = Self::scan_backrun(entries, frontrun, candidate)?;
        Some(SandwichMatch {
            frontrun: frontrun.hash,
            backrun: backrun.hash,
            attacker: frontrun.from,
        })
    }

    fn scan_frontrun<'a>(entries: &'a VecDeque<BufferedEntry>, candidate: &SwapLeg) -> Option<&'a BufferedEntry> {
        let pair = candidate.pair();
        entries.iter().find(|e| {
            e.leg().map_or(false, |leg| {
                leg.pair() == pair && leg.from != candidate.from && leg.token_in == candidate.token_out
            })
        })
    }

    fn scan_backrun<'a>(
        entries: &'a VecDeque<BufferedEntry>,
        frontrun: &BufferedEntry,
        candidate: &SwapLeg,
    ) -> Option<&'a BufferedEntry> {
        let pair = candidate.pair();
        entries.iter().find(|e| {
            e.leg().map_or(false, |leg| {
                leg.pair() == pair
                    && leg.from == frontrun.from
                    && leg.token_out == candidate.token_in
                    && e.timestamp_ms > frontrun.timestamp_ms
            })
        })
    }
}
