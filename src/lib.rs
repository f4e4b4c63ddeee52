//! dualcheck: verification of a precomputed matrix relation over F_P
//!
//! Checks that a dataset matrix `M` and a client file `(r, s)` satisfy
//! `M^T r = s` modulo `P = 2^57 - 13`, either offline or through a one-shot
//! challenge-response exchange `r . (M c) = s . c` with a network peer.
//!
//! Key components:
//! - Exact field arithmetic with `u128` intermediates
//! - Exact-width little-endian decoding of the client and dataset files
//! - Offline dual check and the interactive verifier/auditor pair

pub mod audit;
pub mod error;
pub mod math;
pub mod params;

pub use audit::{
    connect_and_audit, dual_check, handle_exchange, recombine, respond, run_audit, serve_once,
    AuditExchange, ClientConfig, DualCheckOutcome, Exchange, Matrix, Model, Recombination,
    VerificationReport,
};
pub use error::{AuditError, Result, Source};
pub use params::{AuditorConfig, Mode, ServerConfig, P};
