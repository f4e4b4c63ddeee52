//! End-to-end tests: files on disk, verifier and auditor over loopback TCP

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use dualcheck::audit::{
    bind, connect_and_audit, dual_check, serve_once, transpose_mul, ClientConfig, Matrix, Model,
};
use dualcheck::error::AuditError;
use dualcheck::math::ChallengeSampler;
use dualcheck::params::{AuditorConfig, ServerConfig, P};
use tempfile::NamedTempFile;

fn scenario() -> Model {
    let matrix = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
    let client = ClientConfig::new(vec![1, 1], vec![4, 6]).unwrap();
    Model::new(matrix, client).unwrap()
}

/// Random consistent model: s is computed from M and r
fn random_model(rows: usize, cols: usize, seed: u64) -> Model {
    let mut sampler = ChallengeSampler::with_seed(seed);
    let rows: Vec<Vec<u64>> = (0..rows)
        .map(|_| sampler.sample_vec(cols).into_iter().map(|x| x & Matrix::MAX_ENTRY).collect())
        .collect();
    let matrix = Matrix::from_rows(rows).unwrap();
    let r = sampler.sample_vec(matrix.rows());
    let s = transpose_mul(&matrix, &r).unwrap();
    Model::new(matrix, ClientConfig::new(r, s).unwrap()).unwrap()
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

fn loopback_config() -> ServerConfig {
    ServerConfig {
        bind: "127.0.0.1".to_string(),
        port: 0,
        io_timeout_secs: 10,
        ..Default::default()
    }
}

/// Start a verifier on an ephemeral port and return its address
fn spawn_verifier(
    model: Model,
    config: ServerConfig,
) -> (SocketAddr, thread::JoinHandle<dualcheck::Result<dualcheck::Exchange>>) {
    let listener = bind(&config).unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || serve_once(listener, &model, &config));
    (addr, handle)
}

fn auditor_config(addr: SocketAddr, seed: u64) -> AuditorConfig {
    AuditorConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        io_timeout_secs: 10,
        seed: Some(seed),
    }
}

#[test]
fn test_files_on_disk_dual_check() {
    let model = scenario();
    let dataset = write_temp(&model.matrix.to_bytes());
    let client = write_temp(&model.client.to_bytes());

    let loaded = Model::load(dataset.path(), client.path()).unwrap();
    assert!(dual_check(&loaded, true).unwrap().passed);
    assert!(dual_check(&loaded, false).unwrap().passed);
}

#[test]
fn test_files_on_disk_mutated_secret() {
    let mut model = scenario();
    model.client.s[0] = 5;
    let dataset = write_temp(&model.matrix.to_bytes());
    let client = write_temp(&model.client.to_bytes());

    let loaded = Model::load(dataset.path(), client.path()).unwrap();
    let outcome = dual_check(&loaded, true).unwrap();
    assert!(!outcome.passed);
    assert_eq!(outcome.mismatches, vec![0]);
}

#[test]
fn test_truncated_client_file() {
    let model = scenario();
    let dataset = write_temp(&model.matrix.to_bytes());
    let bytes = model.client.to_bytes();
    let client = write_temp(&bytes[..bytes.len() - 1]);

    let err = Model::load(dataset.path(), client.path()).unwrap_err();
    assert!(matches!(err, AuditError::ShortRead { .. }));
}

#[test]
fn test_oversized_client_file() {
    let model = scenario();
    let dataset = write_temp(&model.matrix.to_bytes());
    let mut bytes = model.client.to_bytes();
    bytes.extend_from_slice(&[0; 8]);
    let client = write_temp(&bytes);

    let err = Model::load(dataset.path(), client.path()).unwrap_err();
    assert!(matches!(err, AuditError::TrailingData { extra: 8, .. }));
}

#[test]
fn test_scenario_over_tcp() {
    let (addr, handle) = spawn_verifier(scenario(), loopback_config());

    let mut stream = TcpStream::connect(addr).unwrap();
    let mut request = vec![b'A'];
    request.extend_from_slice(&5u64.to_le_bytes());
    request.extend_from_slice(&7u64.to_le_bytes());
    stream.write_all(&request).unwrap();

    let mut reply = [0u8; 17];
    stream.read_exact(&mut reply).unwrap();
    assert_eq!(reply[0], b'1');
    assert_eq!(u64::from_le_bytes(reply[1..9].try_into().unwrap()), 19);
    assert_eq!(u64::from_le_bytes(reply[9..17].try_into().unwrap()), 43);

    stream.write_all(&42u64.to_le_bytes()).unwrap();

    let exchange = handle.join().unwrap().unwrap();
    assert_eq!(exchange.peer_timing, 42);
    assert_eq!(exchange.recombination.rxr, 62);
    assert_eq!(exchange.recombination.sxc, 62);

    // the connection is closed once the exchange is done
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn test_auditor_against_verifier() {
    let model = random_model(40, 24, 11);
    let client = model.client.clone();
    let (addr, handle) = spawn_verifier(model, loopback_config());

    let audit = connect_and_audit(&auditor_config(addr, 99), &client).unwrap();
    let exchange = handle.join().unwrap().unwrap();

    assert!(audit.recombination.passed());
    assert!(exchange.recombination.passed());
    assert_eq!(audit.recombination, exchange.recombination);
    assert_eq!(audit.challenge, exchange.challenge);
    assert_eq!(audit.response, exchange.response);
    assert!(audit.response.iter().all(|&x| x < P));
}

#[test]
fn test_sequential_verifier() {
    let model = random_model(17, 8, 5);
    let client = model.client.clone();
    let config = ServerConfig {
        parallel: false,
        ..loopback_config()
    };
    let (addr, handle) = spawn_verifier(model, config);

    let audit = connect_and_audit(&auditor_config(addr, 3), &client).unwrap();
    handle.join().unwrap().unwrap();
    assert!(audit.recombination.passed());
}

#[test]
fn test_auditor_detects_inconsistent_verifier() {
    let model = random_model(12, 6, 21);
    let mut client = model.client.clone();
    client.s[3] = (client.s[3] + 1) % P;
    let (addr, handle) = spawn_verifier(model, loopback_config());

    let audit = connect_and_audit(&auditor_config(addr, 8), &client).unwrap();
    handle.join().unwrap().unwrap();
    assert!(!audit.recombination.passed());
}

#[test]
fn test_single_connection_only() {
    let model = scenario();
    let client = model.client.clone();
    let (addr, handle) = spawn_verifier(model, loopback_config());

    connect_and_audit(&auditor_config(addr, 1), &client).unwrap();
    handle.join().unwrap().unwrap();

    assert!(TcpStream::connect(addr).is_err());
}

#[test]
fn test_wrong_command_over_tcp() {
    let (addr, handle) = spawn_verifier(scenario(), loopback_config());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"U").unwrap();

    let err = handle.join().unwrap().unwrap_err();
    assert!(matches!(err, AuditError::Protocol(_)));
}

#[test]
fn test_peer_disconnects_mid_challenge() {
    let (addr, handle) = spawn_verifier(scenario(), loopback_config());

    {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(&[b'A', 5, 0, 0, 0]).unwrap();
    }

    let err = handle.join().unwrap().unwrap_err();
    assert!(matches!(err, AuditError::Connection { .. }));
}

#[test]
fn test_silent_peer_hits_deadline() {
    let config = ServerConfig {
        io_timeout_secs: 1,
        ..loopback_config()
    };
    let (addr, handle) = spawn_verifier(scenario(), config);

    // connect but never send the command byte
    let _stream = TcpStream::connect(addr).unwrap();
    let start = Instant::now();

    let err = handle.join().unwrap().unwrap_err();
    let elapsed = start.elapsed();
    match err {
        AuditError::Connection { context, source } => {
            assert_eq!(context, "reading the command byte");
            assert!(matches!(
                source.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(elapsed < Duration::from_secs(10), "deadline not enforced: {:?}", elapsed);
}
