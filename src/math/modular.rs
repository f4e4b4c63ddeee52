//! Modular arithmetic over F_P
//!
//! All operations accept raw `u64` inputs (not necessarily reduced) and return
//! canonical elements in `[0, P)`. Products are formed in `u128` so the full
//! 116-bit (or, for unreduced inputs, 128-bit) product is reduced exactly.

use crate::params::P;

/// Modular arithmetic operations over F_P
pub struct Fp;

impl Fp {
    /// Reduce a raw value modulo P
    #[inline]
    pub fn reduce(a: u64) -> u64 {
        a % P
    }

    /// Reduce a double-width value modulo P
    #[inline]
    pub fn reduce_wide(a: u128) -> u64 {
        (a % (P as u128)) as u64
    }

    /// Whether `a` already lies in `[0, P)`
    #[inline]
    pub fn is_canonical(a: u64) -> bool {
        a < P
    }

    /// Add two values modulo P
    #[inline]
    pub fn add(a: u64, b: u64) -> u64 {
        Self::reduce_wide((a as u128) + (b as u128))
    }

    /// Subtract two values modulo P
    #[inline]
    pub fn sub(a: u64, b: u64) -> u64 {
        let a = Self::reduce(a);
        let b = Self::reduce(b);
        if a >= b {
            a - b
        } else {
            P - (b - a)
        }
    }

    /// Multiply two values modulo P
    #[inline]
    pub fn mul(a: u64, b: u64) -> u64 {
        Self::reduce_wide((a as u128) * (b as u128))
    }

    /// Negate a value modulo P
    #[inline]
    pub fn neg(a: u64) -> u64 {
        let a = Self::reduce(a);
        if a == 0 {
            0
        } else {
            P - a
        }
    }
}
