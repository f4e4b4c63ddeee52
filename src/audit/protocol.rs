//! Interactive challenge-response verifier (server role)
//!
//! # Wire format
//!
//! ```text
//! peer   -> server: 'A'                  command
//! peer   -> server: n x u64 LE           challenge
//! server -> peer:   '1'                  ack
//! server -> peer:   m x u64 LE           response = M c mod P
//! peer   -> server: 8 bytes              timing word, logged and ignored
//! ```
//!
//! Exactly one connection is served. The listener is consumed by
//! [`serve_once`], so nothing else can connect once the exchange is done.

use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{AuditError, Result, Source};
use crate::params::{ServerConfig, ACK, AUDIT_COMMAND};

use super::decode::Model;
use super::respond::{recombine, respond, respond_sequential, Recombination};
use super::wire::{ExactReader, ExactWriter};

/// Everything observed during one exchange
#[derive(Debug, Clone)]
pub struct Exchange {
    pub challenge: Vec<u64>,
    pub response: Vec<u64>,
    /// Raw timing word sent by the peer, never verified. `dualcheck-audit`
    /// sends microseconds; older C clients send the bits of an `f64` in
    /// seconds.
    pub peer_timing: u64,
    pub recombination: Recombination,
}

impl Exchange {
    /// The timing word read as a `u64` count of microseconds
    pub fn peer_timing_micros(&self) -> u64 {
        self.peer_timing
    }

    /// The timing word read as the bits of an `f64` count of seconds
    pub fn peer_timing_secs_f64(&self) -> f64 {
        f64::from_bits(self.peer_timing)
    }
}

/// Bind the listener described by `config`
pub fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let addr = config.listen_addr();
    TcpListener::bind(&addr).map_err(|e| AuditError::connection(format!("binding {}", addr), e))
}

/// Accept one connection, run the exchange, close the connection
pub fn serve_once(listener: TcpListener, model: &Model, config: &ServerConfig) -> Result<Exchange> {
    let (stream, peer) = listener
        .accept()
        .map_err(|e| AuditError::connection("accepting a connection", e))?;
    drop(listener);
    info!("Connection from {}", peer);

    set_deadlines(&stream, config.io_timeout())?;
    let read_half = stream
        .try_clone()
        .map_err(|e| AuditError::connection("cloning the socket", e))?;

    let exchange = handle_exchange(
        BufReader::new(read_half),
        BufWriter::new(&stream),
        model,
        config.parallel,
    )?;

    // the peer may already have closed its side
    let _ = stream.shutdown(Shutdown::Both);
    debug!("connection closed");
    Ok(exchange)
}

/// Run the server side of one exchange over any reader/writer pair
pub fn handle_exchange<R: Read, W: Write>(
    reader: R,
    writer: W,
    model: &Model,
    parallel: bool,
) -> Result<Exchange> {
    let mut reader = ExactReader::new(reader, Source::Peer);
    let mut writer = ExactWriter::new(writer);

    let command = reader.read_u8("reading the command byte")?;
    if command != AUDIT_COMMAND {
        return Err(AuditError::Protocol(format!(
            "unrecognized command byte 0x{:02x}",
            command
        )));
    }
    debug!("audit command received");

    let challenge = reader.read_u64_vec(model.n(), "reading the challenge")?;
    debug!("challenge received ({} values)", challenge.len());

    writer.write_u8(ACK, "sending the ack")?;
    writer.flush("sending the ack")?;

    let response = if parallel {
        respond(&model.matrix, &challenge)?
    } else {
        respond_sequential(&model.matrix, &challenge)?
    };
    debug!("response computed ({} values)", response.len());

    writer.write_u64_slice(&response, "sending the response")?;
    writer.flush("sending the response")?;
    debug!("response sent");

    let peer_timing = reader.read_u64("reading the timing word")?;
    debug!(
        "peer timing word 0x{:016x} ({} us as u64, {:e} s as f64)",
        peer_timing,
        peer_timing,
        f64::from_bits(peer_timing)
    );

    let recombination = recombine(&model.client, &challenge, &response)?;

    Ok(Exchange {
        challenge,
        response,
        peer_timing,
        recombination,
    })
}

pub(crate) fn set_deadlines(stream: &TcpStream, timeout: Option<Duration>) -> Result<()> {
    stream
        .set_read_timeout(timeout)
        .and_then(|_| stream.set_write_timeout(timeout))
        .map_err(|e| AuditError::connection("setting socket deadlines", e))
}
