use ethereum_types::{U256, U512};
use serde::{Deserialize, Serialize};

/// Fator de escala das razões intermediárias (1 unidade = 0,01%).
const SCALE: u64 = 10_000;
const FEE_NUMERATOR: u64 = 997;
const FEE_DENOMINATOR: u64 = 1_000;

/// Resultado do cálculo de impacto em um pool de produto constante.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    pub price_impact_pct: f64,
    pub relative_size_pct: f64,
    pub amount_out: U256,
}

/// Calcula saída, impacto de preço e tamanho relativo de um swap V2.
///
/// Toda a aritmética é inteira (U512 para os produtos intermediários); as
/// porcentagens são obtidas de razões escaladas por 10 000 e só então
/// convertidas para ponto flutuante. Entradas ou reservas zeradas resultam em
/// um `ImpactResult` zerado.
pub fn compute_impact(amount_in: U256, reserve_in: U256, reserve_out: U256) -> ImpactResult {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return ImpactResult::default();
    }
    try_compute(amount_in, reserve_in, reserve_out).unwrap_or_default()
}

fn try_compute(amount_in: U256, reserve_in: U256, reserve_out: U256) -> Option<ImpactResult> {
    let scale = U512::from(SCALE);
    let amount_in_w = U512::from(amount_in);
    let reserve_in_w = U512::from(reserve_in);
    let reserve_out_w = U512::from(reserve_out);

    let amount_in_with_fee = amount_in_w.checked_mul(U512::from(FEE_NUMERATOR))?;
    let numerator = amount_in_with_fee.checked_mul(reserve_out_w)?;
    let denominator = reserve_in_w
        .checked_mul(U512::from(FEE_DENOMINATOR))?
        .checked_add(amount_in_with_fee)?;
    let amount_out_w = numerator / denominator;

    let new_reserve_in = reserve_in_w.checked_add(amount_in_w)?;
    let new_reserve_out = reserve_out_w.saturating_sub(amount_out_w);

    let price_before = reserve_out_w.checked_mul(scale)? / reserve_in_w;
    let price_after = if new_reserve_out.is_zero() {
        U512::zero()
    } else {
        new_reserve_out.checked_mul(scale)? / new_reserve_in
    };
    let impact_scaled = if price_before.is_zero() {
        U512::zero()
    } else {
        let diff = if price_before >= price_after {
            price_before - price_after
        } else {
            price_after - price_before
        };
        diff.checked_mul(scale)? / price_before
    };
    let relative_scaled = amount_in_w.checked_mul(scale)? / reserve_in_w;

    Some(ImpactResult {
        price_impact_pct: scaled_to_pct(impact_scaled),
        relative_size_pct: scaled_to_pct(relative_scaled),
        amount_out: U256::try_from(amount_out_w).ok()?,
    })
}

// valor escalado por 10 000 -> porcentagem
fn scaled_to_pct(v: U512) -> f64 {
    let raw = if v.bits() <= 128 {
        v.low_u128() as f64
    } else {
        v.to_string().parse::<f64>().unwrap_or(f64::MAX)
    };
    raw / 100.0
}
