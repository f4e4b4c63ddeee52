//! Response computation and recombination
//!
//! The server answers a challenge `c` with `resp = M c mod P`. Both sides then
//! check `r . resp == s . c`, which holds whenever `s = M^T r` because
//! `r . (M c) = (M^T r) . c`.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{AuditError, Result};
use crate::math::dot;

use super::decode::{ClientConfig, Matrix};

/// `M c mod P`, rows in parallel
///
/// Challenge values are used raw; reduction happens inside each product.
pub fn respond(matrix: &Matrix, challenge: &[u64]) -> Result<Vec<u64>> {
    check_challenge(matrix, challenge)?;
    matrix
        .data()
        .par_chunks(matrix.cols())
        .map(|row| dot(row, challenge))
        .collect()
}

/// Sequential `M c mod P`
pub fn respond_sequential(matrix: &Matrix, challenge: &[u64]) -> Result<Vec<u64>> {
    check_challenge(matrix, challenge)?;
    matrix.iter_rows().map(|row| dot(row, challenge)).collect()
}

/// The two inner products compared at the end of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recombination {
    /// `r . resp mod P`
    pub rxr: u64,
    /// `s . c mod P`
    pub sxc: u64,
}

impl Recombination {
    pub fn passed(&self) -> bool {
        self.rxr == self.sxc
    }
}

/// Combine a challenge and its response against the client vectors
pub fn recombine(client: &ClientConfig, challenge: &[u64], response: &[u64]) -> Result<Recombination> {
    Ok(Recombination {
        rxr: dot(&client.r, response)?,
        sxc: dot(&client.s, challenge)?,
    })
}

fn check_challenge(matrix: &Matrix, challenge: &[u64]) -> Result<()> {
    if challenge.len() != matrix.cols() {
        return Err(AuditError::DimensionMismatch {
            left: matrix.cols(),
            right: challenge.len(),
        });
    }
    Ok(())
}
