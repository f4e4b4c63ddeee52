//! Dual-check and challenge-response verification
//!
//! # Flow
//!
//! 1. **Decode**: read `n`, `m`, `r`, `s` from the client file and the
//!    `m x n` matrix `M` from the dataset file
//! 2. **Offline**: recompute `M^T r` and compare it with `s`
//! 3. **Interactive**: accept one peer, answer its challenge `c` with `M c`,
//!    then compare `r . (M c)` with `s . c`
//!
//! The auditor is the other end of step 3 and needs only the client file.
//!
//! # Example
//!
//! ```
//! use dualcheck::audit::{dual_check, recombine, respond, ClientConfig, Matrix, Model};
//!
//! let matrix = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
//! let client = ClientConfig::new(vec![1, 1], vec![4, 6]).unwrap();
//! let model = Model::new(matrix, client).unwrap();
//!
//! assert!(dual_check(&model, true).unwrap().passed);
//!
//! let challenge = [5, 7];
//! let response = respond(&model.matrix, &challenge).unwrap();
//! assert_eq!(response, vec![19, 43]);
//! assert!(recombine(&model.client, &challenge, &response).unwrap().passed());
//! ```

mod auditor;
mod decode;
mod dual;
mod protocol;
mod report;
mod respond;
mod wire;

pub use auditor::{connect_and_audit, run_audit, AuditExchange};
pub use decode::{ClientConfig, Matrix, Model};
pub use dual::{dual_check, transpose_mul, transpose_mul_sequential, DualCheckOutcome};
pub use protocol::{bind, handle_exchange, serve_once, Exchange};
pub use report::{Role, VerificationReport};
pub use respond::{recombine, respond, respond_sequential, Recombination};
pub use wire::{ExactReader, ExactWriter};
