//! Vector operations over F_P

use crate::error::{AuditError, Result};

use super::modular::Fp;

/// Inner product `sum(xs[i] * ys[i]) mod P`
///
/// Each product is reduced before it enters the `u128` accumulator, so the
/// accumulator holds at most `len * P < 2^122` and cannot overflow.
pub fn dot(xs: &[u64], ys: &[u64]) -> Result<u64> {
    if xs.len() != ys.len() {
        return Err(AuditError::DimensionMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }

    let acc = xs
        .iter()
        .zip(ys)
        .fold(0u128, |acc, (&x, &y)| acc + Fp::mul(x, y) as u128);

    Ok(Fp::reduce_wide(acc))
}

/// Element-wise sum of two vectors
pub fn add_vec(xs: &[u64], ys: &[u64]) -> Result<Vec<u64>> {
    if xs.len() != ys.len() {
        return Err(AuditError::DimensionMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    Ok(xs.iter().zip(ys).map(|(&x, &y)| Fp::add(x, y)).collect())
}

/// Multiply every element by the scalar `k`
pub fn scale_vec(xs: &[u64], k: u64) -> Vec<u64> {
    xs.iter().map(|&x| Fp::mul(x, k)).collect()
}
