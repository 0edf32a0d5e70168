// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Buffered byte copy with a running SHA-256 digest.

use std::io::{self, Read, Write};

use sha2::{Digest, Sha256};

/// Totals for one completed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyStats {
    pub bytes: u64,
    /// Lowercase hex SHA-256 of everything written.
    pub sha256: String,
}

/// Copy `reader` into `writer` until EOF, then flush.
///
/// Reads are sequential into a single `buffer_size` buffer. `Interrupted`
/// reads are retried; any other error aborts the copy.
pub fn copy_stream(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    buffer_size: usize,
) -> io::Result<CopyStats> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut hasher = Sha256::new();
    let mut bytes = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        hasher.update(&buf[..n]);
        bytes += n as u64;
    }
    writer.flush()?;

    Ok(CopyStats {
        bytes,
        sha256: hex::encode(hasher.finalize()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields `Interrupted` once before every real read.
    struct Flaky<R> {
        inner: R,
        interrupt_next: bool,
    }

    impl<R: Read> Read for Flaky<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt_next = !self.interrupt_next;
            if self.interrupt_next {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn copies_across_buffer_boundaries() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut out = Vec::new();

        let stats = copy_stream(&mut data.as_slice(), &mut out, 7).unwrap();

        assert_eq!(out, data);
        assert_eq!(stats.bytes, 10_000);
    }

    #[test]
    fn digest_matches_known_value() {
        let mut out = Vec::new();
        let stats = copy_stream(&mut &b"abc"[..], &mut out, 4096).unwrap();
        assert_eq!(
            stats.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_source_copies_nothing() {
        let mut out = Vec::new();
        let stats = copy_stream(&mut io::empty(), &mut out, 4096).unwrap();
        assert_eq!(stats.bytes, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let mut reader = Flaky {
            inner: &b"hello world"[..],
            interrupt_next: false,
        };
        let mut out = Vec::new();
        let stats = copy_stream(&mut reader, &mut out, 3).unwrap();
        assert_eq!(out, b"hello world");
        assert_eq!(stats.bytes, 11);
    }

    #[test]
    fn write_errors_propagate() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = copy_stream(&mut &b"data"[..], &mut Full, 16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::StorageFull);
    }
}
