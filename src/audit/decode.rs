//! Decoding of the client and dataset files
//!
//! # Client file
//!
//! ```text
//! offset 0:       n        (8 bytes LE)
//! offset 8:       m        (8 bytes LE)
//! offset 16:      r[0..m)  (m x 8 bytes LE)
//! offset 16+8m:   s[0..n)  (n x 8 bytes LE)
//! ```
//!
//! The file must end exactly after `s`.
//!
//! # Dataset file
//!
//! `m x n` matrix entries, row-major, 7 bytes LE each, no header.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;
use tracing::{debug, info, warn};

use crate::error::{AuditError, Result, Source};
use crate::math::Fp;
use crate::params::{CLIENT_HEADER_BYTES, MATRIX_ENTRY_BYTES, VECTOR_ENTRY_BYTES};

use super::wire::ExactReader;

/// Contents of the client file: dimensions, weight vector `r` and secret `s`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Number of matrix columns (length of `s` and of challenges)
    pub n: usize,
    /// Number of matrix rows (length of `r` and of responses)
    pub m: usize,
    /// Weight vector, length m
    pub r: Vec<u64>,
    /// Claimed `M^T r`, length n
    pub s: Vec<u64>,
}

impl ClientConfig {
    /// Build from vectors, taking the dimensions from their lengths
    pub fn new(r: Vec<u64>, s: Vec<u64>) -> Result<Self> {
        let (n, m) = (s.len(), r.len());
        check_dimensions(n as u64, m as u64)?;
        Ok(Self { n, m, r, s })
    }

    /// Decode from any byte source, requiring it to end right after `s`
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ExactReader::new(reader, Source::Client);

        let n = reader.read_u64("dimension n")?;
        let m = reader.read_u64("dimension m")?;
        let (n, m) = check_dimensions(n, m)?;
        debug!("client header: n={}, m={}", n, m);

        let r = reader.read_u64_vec(m, "vector r")?;
        let s = reader.read_u64_vec(n, "vector s")?;
        reader.expect_end()?;

        Ok(Self { n, m, r, s })
    }

    /// Map the file at `path` read-only and decode it
    pub fn open(path: &Path) -> Result<Self> {
        let config = with_mapped(path, |bytes| Self::read_from(Cursor::new(bytes)))?;

        let non_canonical = config.non_canonical_count();
        if non_canonical > 0 {
            warn!(
                "{} client vector entries are >= P and will be reduced during arithmetic",
                non_canonical
            );
        }
        Ok(config)
    }

    /// Number of entries of `r` and `s` outside `[0, P)`
    pub fn non_canonical_count(&self) -> usize {
        self.r
            .iter()
            .chain(&self.s)
            .filter(|&&x| !Fp::is_canonical(x))
            .count()
    }

    /// Exact byte length of the encoded file
    pub fn encoded_len(&self) -> usize {
        CLIENT_HEADER_BYTES + VECTOR_ENTRY_BYTES * (self.m + self.n)
    }

    /// Encode in the client file layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.encoded_len()];
        LittleEndian::write_u64(&mut out[0..8], self.n as u64);
        LittleEndian::write_u64(&mut out[8..16], self.m as u64);
        let r_end = CLIENT_HEADER_BYTES + VECTOR_ENTRY_BYTES * self.m;
        LittleEndian::write_u64_into(&self.r, &mut out[CLIENT_HEADER_BYTES..r_end]);
        LittleEndian::write_u64_into(&self.s, &mut out[r_end..]);
        out
    }
}

/// Dense row-major matrix of 56-bit entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u64>,
}

impl Matrix {
    /// Largest value a 7-byte entry can hold
    pub const MAX_ENTRY: u64 = (1 << (8 * MATRIX_ENTRY_BYTES)) - 1;

    /// Build from explicit rows; every row must have the same length and
    /// every entry must fit in 7 bytes
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self> {
        let m = rows.len();
        let n = rows.first().map_or(0, Vec::len);
        check_dimensions(n as u64, m as u64)?;

        let mut data = Vec::with_capacity(m * n);
        for row in rows {
            if row.len() != n {
                return Err(AuditError::DimensionMismatch {
                    left: n,
                    right: row.len(),
                });
            }
            if let Some(&bad) = row.iter().find(|&&x| x > Self::MAX_ENTRY) {
                return Err(AuditError::InvalidConfig(format!(
                    "matrix entry {} does not fit in {} bytes",
                    bad, MATRIX_ENTRY_BYTES
                )));
            }
            data.extend(row);
        }

        Ok(Self {
            rows: m,
            cols: n,
            data,
        })
    }

    /// Decode `rows x cols` entries from any byte source
    ///
    /// Bytes after the last entry are left unread.
    pub fn read_from<R: Read>(reader: R, rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(cols as u64, rows as u64)?;
        let mut reader = ExactReader::new(reader, Source::Dataset);

        let mut data = Vec::new();
        for i in 0..rows {
            let start = data.len();
            data.resize(start + cols, 0);
            reader.read_u56_into(&mut data[start..], &format!("matrix row {}", i))?;
        }

        Ok(Self { rows, cols, data })
    }

    /// Map the dataset file read-only and decode `rows x cols` entries
    pub fn open(path: &Path, rows: usize, cols: usize) -> Result<Self> {
        let expected = matrix_bytes(rows, cols)?;
        with_mapped(path, |bytes| {
            if bytes.len() < expected {
                return Err(AuditError::ShortRead {
                    origin: Source::Dataset,
                    context: format!("{} x {} matrix", rows, cols),
                    expected,
                });
            }
            if bytes.len() > expected {
                warn!(
                    "dataset has {} bytes beyond the {} x {} matrix; ignoring them",
                    bytes.len() - expected,
                    rows,
                    cols
                );
            }
            Self::read_from(Cursor::new(&bytes[..expected]), rows, cols)
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `i` as a slice of length `cols`
    pub fn row(&self, i: usize) -> &[u64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterator over rows in order
    pub fn iter_rows(&self) -> std::slice::ChunksExact<'_, u64> {
        self.data.chunks_exact(self.cols)
    }

    /// Entry at row `i`, column `k`
    pub fn get(&self, i: usize, k: usize) -> u64 {
        self.data[i * self.cols + k]
    }

    pub(crate) fn data(&self) -> &[u64] {
        &self.data
    }

    /// Encode in the dataset file layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.data.len() * MATRIX_ENTRY_BYTES];
        for (chunk, &value) in out.chunks_exact_mut(MATRIX_ENTRY_BYTES).zip(&self.data) {
            LittleEndian::write_uint(chunk, value, MATRIX_ENTRY_BYTES);
        }
        out
    }
}

/// Decoded inputs of one verification run
#[derive(Debug, Clone)]
pub struct Model {
    pub client: ClientConfig,
    pub matrix: Matrix,
}

impl Model {
    /// Pair a matrix with a client config whose dimensions match it
    pub fn new(matrix: Matrix, client: ClientConfig) -> Result<Self> {
        if matrix.rows() != client.m {
            return Err(AuditError::DimensionMismatch {
                left: matrix.rows(),
                right: client.m,
            });
        }
        if matrix.cols() != client.n {
            return Err(AuditError::DimensionMismatch {
                left: matrix.cols(),
                right: client.n,
            });
        }
        if client.r.len() != client.m {
            return Err(AuditError::DimensionMismatch {
                left: client.m,
                right: client.r.len(),
            });
        }
        if client.s.len() != client.n {
            return Err(AuditError::DimensionMismatch {
                left: client.n,
                right: client.s.len(),
            });
        }
        Ok(Self { client, matrix })
    }

    /// Load the client file, then the `m x n` dataset it describes
    pub fn load(dataset_path: &Path, client_path: &Path) -> Result<Self> {
        info!("Loading client file {}", client_path.display());
        let client = ClientConfig::open(client_path)?;
        info!("Dimensions: n={}, m={}", client.n, client.m);

        info!("Loading dataset {}", dataset_path.display());
        let matrix = Matrix::open(dataset_path, client.m, client.n)?;

        Self::new(matrix, client)
    }

    pub fn n(&self) -> usize {
        self.client.n
    }

    pub fn m(&self) -> usize {
        self.client.m
    }
}

/// Validate header dimensions and convert them to `usize`
fn check_dimensions(n: u64, m: u64) -> Result<(usize, usize)> {
    let invalid = || AuditError::InvalidDimensions { n, m };
    if n == 0 || m == 0 {
        return Err(invalid());
    }
    let n_usize = usize::try_from(n).map_err(|_| invalid())?;
    let m_usize = usize::try_from(m).map_err(|_| invalid())?;
    matrix_bytes(m_usize, n_usize)?;
    Ok((n_usize, m_usize))
}

fn matrix_bytes(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .and_then(|entries| entries.checked_mul(MATRIX_ENTRY_BYTES))
        .ok_or(AuditError::InvalidDimensions {
            n: cols as u64,
            m: rows as u64,
        })
}

/// Run `f` over a read-only mapping of `path`; the mapping is released on return
fn with_mapped<T>(path: &Path, f: impl FnOnce(&[u8]) -> Result<T>) -> Result<T> {
    let io_err = |source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    if len == 0 {
        let empty: &[u8] = &[];
        return f(empty);
    }
    // SAFETY: read-only mapping, dropped before this function returns
    let mmap = unsafe { Mmap::map(&file).map_err(io_err)? };
    f(&mmap[..])
}
