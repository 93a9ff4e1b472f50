use parking_lot::Mutex;
use std::collections::VecDeque;

/// Capacidade padrão da janela de gás.
pub const DEFAULT_GAS_WINDOW_CAPACITY: usize = 500;

/// Janela FIFO limitada com os preços de gás observados mais recentemente.
///
/// Compartilhada entre análises concorrentes; toda mutação passa pelo mesmo
/// mutex, o que mantém a ordem de descarte e o limite de capacidade.
#[derive(Debug)]
pub struct GasWindow {
    capacity: usize,
    samples: Mutex<VecDeque<f64>>,
}

impl Default for GasWindow {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_WINDOW_CAPACITY)
    }
}

impl GasWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Registra uma amostra, descartando a mais antiga quando cheia.
    pub fn record(&self, gas_price: f64) {
        let mut samples = self.samples.lock();
        Self::push(&mut samples, self.capacity, gas_price);
    }

    /// Registra a amostra e devolve a mediana já incluindo-a, sob um único lock.
    pub fn record_and_median(&self, gas_price: f64) -> f64 {
        let snapshot: Vec<f64> = {
            let mut samples = self.samples.lock();
            Self::push(&mut samples, self.capacity, gas_price);
            samples.iter().copied().collect()
        };
        median(&snapshot)
    }

    /// Mediana das amostras atuais (0 se vazia).
    pub fn median(&self) -> f64 {
        let snapshot: Vec<f64> = self.samples.lock().iter().copied().collect();
        median(&snapshot)
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cópia das amostras, da mais antiga para a mais recente.
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.lock().iter().copied().collect()
    }

    fn push(samples: &mut VecDeque<f64>, capacity: usize, gas_price: f64) {
        if !gas_price.is_finite() {
            return;
        }
        while samples.len() >= capacity {
            samples.pop_front();
        }
        samples.push_back(gas_price);
    }
}

/// Mediana de um conjunto de valores; média dos dois centrais quando par.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}
