//! Exact-width little-endian reads and writes
//!
//! Every read either fills the requested number of bytes or fails; there is
//! no zero padding and no partial value. The same reader serves the client
//! file, the dataset file and the network peer, and maps exhaustion to the
//! error that fits the source.

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{AuditError, Result, Source};
use crate::params::{MATRIX_ENTRY_BYTES, VECTOR_ENTRY_BYTES};

/// Vectors are read this many elements at a time so that an untrusted
/// length in a header cannot trigger one huge allocation up front.
const READ_CHUNK: usize = 1 << 16;

/// Reader that fails unless every requested byte is available
pub struct ExactReader<R> {
    inner: R,
    source: Source,
}

impl<R: Read> ExactReader<R> {
    pub fn new(inner: R, source: Source) -> Self {
        Self { inner, source }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Read a single byte
    pub fn read_u8(&mut self, context: &str) -> Result<u8> {
        self.inner
            .read_u8()
            .map_err(|e| read_error(self.source, e, context, 1))
    }

    /// Read one 8-byte little-endian value
    pub fn read_u64(&mut self, context: &str) -> Result<u64> {
        self.inner
            .read_u64::<LittleEndian>()
            .map_err(|e| read_error(self.source, e, context, VECTOR_ENTRY_BYTES))
    }

    /// Read `len` consecutive 8-byte little-endian values
    pub fn read_u64_vec(&mut self, len: usize, context: &str) -> Result<Vec<u64>> {
        let expected = len.saturating_mul(VECTOR_ENTRY_BYTES);
        let mut out = Vec::with_capacity(len.min(READ_CHUNK));
        let mut remaining = len;
        while remaining > 0 {
            let take = remaining.min(READ_CHUNK);
            let start = out.len();
            out.resize(start + take, 0);
            self.inner
                .read_u64_into::<LittleEndian>(&mut out[start..])
                .map_err(|e| read_error(self.source, e, context, expected))?;
            remaining -= take;
        }
        Ok(out)
    }

    /// Fill `out` with consecutive 7-byte little-endian values
    pub fn read_u56_into(&mut self, out: &mut [u64], context: &str) -> Result<()> {
        let mut buf = vec![0u8; out.len() * MATRIX_ENTRY_BYTES];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| read_error(self.source, e, context, buf.len()))?;
        for (value, bytes) in out.iter_mut().zip(buf.chunks_exact(MATRIX_ENTRY_BYTES)) {
            *value = LittleEndian::read_uint(bytes, MATRIX_ENTRY_BYTES);
        }
        Ok(())
    }

    /// Fail with `TrailingData` if the source has bytes left
    pub fn expect_end(&mut self) -> Result<()> {
        let extra = self.remaining()?;
        if extra > 0 {
            return Err(AuditError::TrailingData {
                origin: self.source,
                extra,
            });
        }
        Ok(())
    }

    /// Drain the source and count what was left
    pub fn remaining(&mut self) -> Result<u64> {
        io::copy(&mut self.inner, &mut io::sink())
            .map_err(|e| read_error(self.source, e, "draining trailing bytes", 0))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writer that fails unless every byte is written
pub struct ExactWriter<W> {
    inner: W,
}

impl<W: Write> ExactWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write a single byte
    pub fn write_u8(&mut self, byte: u8, context: &str) -> Result<()> {
        self.inner
            .write_u8(byte)
            .map_err(|e| AuditError::connection(context, e))
    }

    /// Write one 8-byte little-endian value
    pub fn write_u64(&mut self, value: u64, context: &str) -> Result<()> {
        self.inner
            .write_u64::<LittleEndian>(value)
            .map_err(|e| AuditError::connection(context, e))
    }

    /// Write a vector as consecutive 8-byte little-endian values
    pub fn write_u64_slice(&mut self, values: &[u64], context: &str) -> Result<()> {
        let mut buf = vec![0u8; values.len() * VECTOR_ENTRY_BYTES];
        LittleEndian::write_u64_into(values, &mut buf);
        self.inner
            .write_all(&buf)
            .map_err(|e| AuditError::connection(context, e))
    }

    pub fn flush(&mut self, context: &str) -> Result<()> {
        self.inner
            .flush()
            .map_err(|e| AuditError::connection(context, e))
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn read_error(source: Source, err: io::Error, context: &str, expected: usize) -> AuditError {
    match source {
        Source::Peer => AuditError::connection(context, err),
        Source::Client | Source::Dataset if err.kind() == io::ErrorKind::UnexpectedEof => {
            AuditError::ShortRead {
                origin: source,
                context: context.to_string(),
                expected,
            }
        }
        Source::Client | Source::Dataset => AuditError::FileRead {
            origin: source,
            context: context.to_string(),
            source: err,
        },
    }
}
