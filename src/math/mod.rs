//! Arithmetic over the prime field F_P.
//!
//! - **Modular arithmetic** on raw `u64` values with `u128` intermediates
//! - **Vector operations**: inner products and element-wise helpers
//! - **Challenge sampling** uniform over `[0, P)`
//!
//! # Example
//!
//! ```
//! use dualcheck::math::{dot, Fp};
//!
//! assert_eq!(Fp::mul(3, 4), 12);
//! assert_eq!(dot(&[1, 1], &[19, 43]).unwrap(), 62);
//! ```

pub mod modular;
pub mod sampler;
pub mod vector;

pub use modular::Fp;
pub use sampler::ChallengeSampler;
pub use vector::{add_vec, dot, scale_vec};
