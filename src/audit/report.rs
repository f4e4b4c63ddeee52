//! Human-readable and JSON verification reports

use std::fmt;
use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::error::{AuditError, Result};
use crate::params::Mode;

use super::auditor::AuditExchange;
use super::dual::DualCheckOutcome;
use super::protocol::Exchange;
use super::respond::Recombination;

/// Which side produced the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Verifier,
    Auditor,
}

/// Outcome of one run, printed by the drivers and optionally saved as JSON
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub role: Role,
    pub mode: Mode,
    pub n: usize,
    pub m: usize,
    pub passed: bool,
    /// `r . resp mod P` (interactive only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rxr: Option<u64>,
    /// `s . c mod P` (interactive only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sxc: Option<u64>,
    /// First and last challenge values (interactive only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_ends: Option<(u64, u64)>,
    /// First and last response values (interactive only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_ends: Option<(u64, u64)>,
    /// First differing columns (offline only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mismatched_columns: Vec<usize>,
    pub mismatch_count: usize,
    pub elapsed_ms: u64,
}

impl VerificationReport {
    pub fn from_dual_check(n: usize, m: usize, outcome: &DualCheckOutcome, elapsed_ms: u64) -> Self {
        Self {
            role: Role::Verifier,
            mode: Mode::Offline,
            n,
            m,
            passed: outcome.passed,
            rxr: None,
            sxc: None,
            challenge_ends: None,
            response_ends: None,
            mismatched_columns: outcome.mismatches.clone(),
            mismatch_count: outcome.mismatch_count,
            elapsed_ms,
        }
    }

    pub fn from_exchange(n: usize, m: usize, exchange: &Exchange, elapsed_ms: u64) -> Self {
        Self::interactive(
            Role::Verifier,
            n,
            m,
            &exchange.challenge,
            &exchange.response,
            &exchange.recombination,
            elapsed_ms,
        )
    }

    pub fn from_audit(n: usize, m: usize, exchange: &AuditExchange, elapsed_ms: u64) -> Self {
        Self::interactive(
            Role::Auditor,
            n,
            m,
            &exchange.challenge,
            &exchange.response,
            &exchange.recombination,
            elapsed_ms,
        )
    }

    fn interactive(
        role: Role,
        n: usize,
        m: usize,
        challenge: &[u64],
        response: &[u64],
        recombination: &Recombination,
        elapsed_ms: u64,
    ) -> Self {
        let Recombination { rxr, sxc } = *recombination;
        let passed = recombination.passed();
        Self {
            role,
            mode: Mode::Interactive,
            n,
            m,
            passed,
            rxr: Some(rxr),
            sxc: Some(sxc),
            challenge_ends: ends(challenge),
            response_ends: ends(response),
            mismatched_columns: Vec::new(),
            mismatch_count: usize::from(!passed),
            elapsed_ms,
        }
    }

    /// Write the report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        serde_json::to_writer_pretty(file, self).map_err(|e| io_err(e.into()))
    }
}

fn ends(values: &[u64]) -> Option<(u64, u64)> {
    values.first().zip(values.last()).map(|(&a, &b)| (a, b))
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "n = {}", self.n)?;
        writeln!(f, "m = {}", self.m)?;
        if let Some((first, last)) = self.challenge_ends {
            writeln!(f, "challenge[0] = {}", first)?;
            writeln!(f, "challenge[n-1] = {}", last)?;
        }
        if let Some((first, last)) = self.response_ends {
            writeln!(f, "response[0] = {}", first)?;
            writeln!(f, "response[m-1] = {}", last)?;
        }
        if let (Some(rxr), Some(sxc)) = (self.rxr, self.sxc) {
            writeln!(f, "rxr = {}", rxr)?;
            writeln!(f, "sxc = {}", sxc)?;
        }
        if !self.mismatched_columns.is_empty() {
            writeln!(
                f,
                "mismatched columns ({} total): {:?}",
                self.mismatch_count, self.mismatched_columns
            )?;
        }
        write!(f, "{}", if self.passed { "PASSED" } else { "FAILED" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(rxr: u64, sxc: u64) -> Exchange {
        Exchange {
            challenge: vec![5, 7],
            response: vec![19, 43],
            peer_timing: 0,
            recombination: Recombination { rxr, sxc },
        }
    }

    #[test]
    fn test_interactive_report() {
        let report = VerificationReport::from_exchange(2, 2, &exchange(62, 62), 3);
        assert!(report.passed);
        assert_eq!(report.challenge_ends, Some((5, 7)));
        assert_eq!(report.response_ends, Some((19, 43)));

        let text = report.to_string();
        assert!(text.contains("response[0] = 19"));
        assert!(text.contains("response[m-1] = 43"));
        assert!(text.contains("rxr = 62"));
        assert!(text.contains("sxc = 62"));
        assert!(text.ends_with("PASSED"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "interactive");
        assert_eq!(json["role"], "verifier");
        assert_eq!(json["rxr"], 62);
        assert!(json.get("mismatched_columns").is_none());
        assert_eq!(json["response_ends"][1], 43);
    }

    #[test]
    fn test_auditor_report_shows_response() {
        let audit = AuditExchange {
            challenge: vec![5, 7],
            response: vec![19, 43],
            comm_time: std::time::Duration::from_micros(10),
            recombination: Recombination { rxr: 62, sxc: 62 },
        };
        let report = VerificationReport::from_audit(2, 2, &audit, 1);
        assert_eq!(report.role, Role::Auditor);
        assert_eq!(report.response_ends, Some((19, 43)));
        assert!(report.to_string().contains("response[m-1] = 43"));
    }

    #[test]
    fn test_failed_report() {
        let report = VerificationReport::from_exchange(2, 2, &exchange(62, 67), 0);
        assert!(!report.passed);
        assert_eq!(report.mismatch_count, 1);
        assert!(report.to_string().ends_with("FAILED"));
    }

    #[test]
    fn test_dual_check_report() {
        let outcome = DualCheckOutcome {
            computed: vec![4, 6],
            mismatches: vec![1],
            mismatch_count: 1,
            passed: false,
        };
        let report = VerificationReport::from_dual_check(2, 2, &outcome, 0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "offline");
        assert!(json.get("rxr").is_none());
        assert!(json.get("response_ends").is_none());
        assert_eq!(json["mismatched_columns"][0], 1);
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        VerificationReport::from_exchange(2, 2, &exchange(62, 62), 0)
            .save(&path)
            .unwrap();
        let saved: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(saved["passed"], true);
    }
}
