//! Field constants, wire widths and run configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

/// Field modulus P = 2^57 - 13 = 144115188075855859
pub const P: u64 = 144115188075855859;

/// Width of one matrix entry in the dataset file
pub const MATRIX_ENTRY_BYTES: usize = 7;

/// Width of one vector entry (client file and network)
pub const VECTOR_ENTRY_BYTES: usize = 8;

/// Size of the `n`, `m` header at the start of the client file
pub const CLIENT_HEADER_BYTES: usize = 2 * VECTOR_ENTRY_BYTES;

/// Command byte that opens an audit exchange
pub const AUDIT_COMMAND: u8 = b'A';

/// Acknowledgement byte sent after the challenge is received
pub const ACK: u8 = b'1';

/// Default TCP port
pub const DEFAULT_PORT: u16 = 2020;

/// Default read/write deadline on the connection, in seconds
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 60;

/// Which driver runs over the decoded model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Serve one challenge-response exchange over TCP
    #[default]
    Interactive,
    /// Check `M^T r == s` without any network use
    Offline,
}

/// Verifier (server role) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Driver selection
    pub mode: Mode,

    /// Address to bind the listener to
    pub bind: String,

    /// Port to listen on
    pub port: u16,

    /// Read/write deadline on the accepted connection, in seconds (0 disables)
    pub io_timeout_secs: u64,

    /// Use rayon for matrix products
    pub parallel: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Interactive,
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            io_timeout_secs: DEFAULT_IO_TIMEOUT_SECS,
            parallel: true,
        }
    }
}

impl ServerConfig {
    /// `bind:port` as passed to the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.io_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind.trim().is_empty() {
            return Err(AuditError::InvalidConfig("bind address is empty".into()));
        }
        Ok(())
    }
}

/// Auditor (client role) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditorConfig {
    /// Verifier host
    pub host: String,

    /// Verifier port
    pub port: u16,

    /// Read/write deadline on the connection, in seconds (0 disables)
    pub io_timeout_secs: u64,

    /// Seed for the challenge sampler; entropy when absent
    pub seed: Option<u64>,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            io_timeout_secs: DEFAULT_IO_TIMEOUT_SECS,
            seed: None,
        }
    }
}

impl AuditorConfig {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.io_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AuditError::InvalidConfig("host is empty".into()));
        }
        if self.port == 0 {
            return Err(AuditError::InvalidConfig("port must be non-zero".into()));
        }
        Ok(())
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
