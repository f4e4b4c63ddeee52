//! Auditor (client role) of the challenge-response exchange
//!
//! The auditor holds only the client file. It sends a fresh uniform challenge,
//! receives `M c`, and checks `r . resp == s . c` on its own.

use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{AuditError, Result, Source};
use crate::math::ChallengeSampler;
use crate::params::{AuditorConfig, ACK, AUDIT_COMMAND};

use super::decode::ClientConfig;
use super::protocol::set_deadlines;
use super::respond::{recombine, Recombination};
use super::wire::{ExactReader, ExactWriter};

/// Everything observed by the auditor during one exchange
#[derive(Debug, Clone)]
pub struct AuditExchange {
    pub challenge: Vec<u64>,
    pub response: Vec<u64>,
    /// Time from starting to send the challenge until the ack arrived
    pub comm_time: Duration,
    pub recombination: Recombination,
}

/// Connect to the verifier in `config` and audit it with a fresh challenge
pub fn connect_and_audit(config: &AuditorConfig, client: &ClientConfig) -> Result<AuditExchange> {
    let mut sampler = match config.seed {
        Some(seed) => ChallengeSampler::with_seed(seed),
        None => ChallengeSampler::new(),
    };
    let challenge = sampler.sample_vec(client.n);

    let addr = config.server_addr();
    let stream = TcpStream::connect(&addr)
        .map_err(|e| AuditError::connection(format!("connecting to {}", addr), e))?;
    info!("Connected to {}", addr);

    set_deadlines(&stream, config.io_timeout())?;
    let read_half = stream
        .try_clone()
        .map_err(|e| AuditError::connection("cloning the socket", e))?;

    let exchange = run_audit(BufReader::new(read_half), BufWriter::new(&stream), client, challenge)?;

    let _ = stream.shutdown(Shutdown::Both);
    Ok(exchange)
}

/// Run the auditor side of one exchange over any reader/writer pair
pub fn run_audit<R: Read, W: Write>(
    reader: R,
    writer: W,
    client: &ClientConfig,
    challenge: Vec<u64>,
) -> Result<AuditExchange> {
    if challenge.len() != client.n {
        return Err(AuditError::DimensionMismatch {
            left: client.n,
            right: challenge.len(),
        });
    }
    let mut reader = ExactReader::new(reader, Source::Peer);
    let mut writer = ExactWriter::new(writer);

    writer.write_u8(AUDIT_COMMAND, "sending the command byte")?;
    writer.flush("sending the command byte")?;

    let start = Instant::now();
    writer.write_u64_slice(&challenge, "sending the challenge")?;
    writer.flush("sending the challenge")?;

    let ack = reader.read_u8("reading the ack")?;
    let comm_time = start.elapsed();
    if ack != ACK {
        return Err(AuditError::Protocol(format!(
            "expected ack 0x{:02x}, got 0x{:02x}",
            ACK, ack
        )));
    }
    debug!("ack received after {:.2?}", comm_time);

    let response = reader.read_u64_vec(client.m, "reading the response")?;
    debug!("response received ({} values)", response.len());

    // microseconds; the verifier also recognizes an f64 seconds encoding
    let micros = u64::try_from(comm_time.as_micros()).unwrap_or(u64::MAX);
    writer.write_u64(micros, "sending the timing word")?;
    writer.flush("sending the timing word")?;

    let recombination = recombine(client, &challenge, &response)?;

    Ok(AuditExchange {
        challenge,
        response,
        comm_time,
        recombination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

    fn client() -> ClientConfig {
        ClientConfig::new(vec![1, 1], vec![4, 6]).unwrap()
    }

    fn server_reply(ack: u8, response: &[u64]) -> Vec<u8> {
        let mut bytes = vec![ack];
        for &x in response {
            bytes.write_u64::<LittleEndian>(x).unwrap();
        }
        bytes
    }

    #[test]
    fn test_scenario_audit() {
        let reply = server_reply(b'1', &[19, 43]);
        let mut sent = Vec::<u8>::new();

        let exchange = run_audit(&reply[..], &mut sent, &client(), vec![5, 7]).unwrap();

        assert_eq!(exchange.response, vec![19, 43]);
        assert_eq!(exchange.recombination, Recombination { rxr: 62, sxc: 62 });
        assert!(exchange.recombination.passed());

        // command, challenge, timing word
        assert_eq!(sent.len(), 1 + 16 + 8);
        assert_eq!(sent[0], b'A');
        assert_eq!(LittleEndian::read_u64(&sent[1..9]), 5);
        assert_eq!(LittleEndian::read_u64(&sent[9..17]), 7);
    }

    #[test]
    fn test_bad_ack() {
        let reply = server_reply(b'0', &[19, 43]);
        let err = run_audit(&reply[..], std::io::sink(), &client(), vec![5, 7]).unwrap_err();
        assert!(matches!(err, AuditError::Protocol(_)));
    }

    #[test]
    fn test_wrong_response_fails() {
        let reply = server_reply(b'1', &[19, 44]);
        let exchange = run_audit(&reply[..], std::io::sink(), &client(), vec![5, 7]).unwrap();
        assert!(!exchange.recombination.passed());
    }

    #[test]
    fn test_short_response() {
        let mut reply = server_reply(b'1', &[19, 43]);
        reply.pop();
        let err = run_audit(&reply[..], std::io::sink(), &client(), vec![5, 7]).unwrap_err();
        assert!(matches!(err, AuditError::Connection { .. }));
    }

    #[test]
    fn test_challenge_length_checked() {
        let err = run_audit(&[0u8; 0][..], std::io::sink(), &client(), vec![5]).unwrap_err();
        assert!(matches!(err, AuditError::DimensionMismatch { .. }));
    }
}
