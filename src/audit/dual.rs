//! Offline dual check: recompute `M^T r` and compare it with `s`

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{AuditError, Result};
use crate::math::Fp;

use super::decode::{Matrix, Model};

/// At most this many mismatching columns are kept in an outcome
pub const MAX_REPORTED_MISMATCHES: usize = 16;

/// Result of a dual check
#[derive(Debug, Clone, Serialize)]
pub struct DualCheckOutcome {
    /// Recomputed `M^T r mod P`
    #[serde(skip)]
    pub computed: Vec<u64>,
    /// First few column indices where `computed` differs from `s`
    pub mismatches: Vec<usize>,
    /// Total number of differing columns
    pub mismatch_count: usize,
    pub passed: bool,
}

/// Check `M^T r == s` element-wise
///
/// The comparison is on raw values: a client file that stores an entry of
/// `s` as a non-canonical representative fails the check.
pub fn dual_check(model: &Model, parallel: bool) -> Result<DualCheckOutcome> {
    let computed = if parallel {
        transpose_mul(&model.matrix, &model.client.r)?
    } else {
        transpose_mul_sequential(&model.matrix, &model.client.r)?
    };
    if model.client.s.len() != computed.len() {
        return Err(AuditError::DimensionMismatch {
            left: computed.len(),
            right: model.client.s.len(),
        });
    }

    let mut mismatches = Vec::new();
    let mut mismatch_count = 0;
    for (k, (&expected, &actual)) in model.client.s.iter().zip(&computed).enumerate() {
        if expected != actual {
            mismatch_count += 1;
            if mismatches.len() < MAX_REPORTED_MISMATCHES {
                mismatches.push(k);
            }
        }
    }
    debug!("dual check: {} of {} columns differ", mismatch_count, computed.len());

    Ok(DualCheckOutcome {
        computed,
        mismatches,
        mismatch_count,
        passed: mismatch_count == 0,
    })
}

/// `M^T r mod P`, rows folded in parallel into per-thread column accumulators
pub fn transpose_mul(matrix: &Matrix, r: &[u64]) -> Result<Vec<u64>> {
    check_len(matrix, r)?;
    let cols = matrix.cols();

    let sums = matrix
        .data()
        .par_chunks(cols)
        .zip(r.par_iter())
        .fold(
            || vec![0u128; cols],
            |mut acc, (row, &weight)| {
                accumulate_row(&mut acc, row, weight);
                acc
            },
        )
        .reduce(
            || vec![0u128; cols],
            |mut left, right| {
                for (l, x) in left.iter_mut().zip(right) {
                    *l += x;
                }
                left
            },
        );

    Ok(sums.into_iter().map(Fp::reduce_wide).collect())
}

/// Sequential `M^T r mod P`
pub fn transpose_mul_sequential(matrix: &Matrix, r: &[u64]) -> Result<Vec<u64>> {
    check_len(matrix, r)?;

    let mut acc = vec![0u128; matrix.cols()];
    for (row, &weight) in matrix.iter_rows().zip(r) {
        accumulate_row(&mut acc, row, weight);
    }

    Ok(acc.into_iter().map(Fp::reduce_wide).collect())
}

/// Each term is reduced below P first, so an accumulator over m rows stays
/// below `m * P`, far from the u128 limit.
#[inline]
fn accumulate_row(acc: &mut [u128], row: &[u64], weight: u64) {
    for (a, &entry) in acc.iter_mut().zip(row) {
        *a += Fp::mul(weight, entry) as u128;
    }
}

fn check_len(matrix: &Matrix, r: &[u64]) -> Result<()> {
    if r.len() != matrix.rows() {
        return Err(AuditError::DimensionMismatch {
            left: matrix.rows(),
            right: r.len(),
        });
    }
    Ok(())
}
