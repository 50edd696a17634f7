//! Temporary spill file
//!
//! An append-only temporary file holding full-encoded values back to back.
//! A running CRC32 covers every appended byte; `finish` flushes and seals
//! the checksum, and readers verify it once they have consumed the whole
//! file. The file is removed from disk when the `SpillFile` is dropped.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crc32fast::Hasher;
use tempfile::NamedTempFile;

use super::errors::{SpillError, SpillResult};
use crate::observability::{Event, Logger, MetricsRegistry};

const PREFIX: &str = "jsonq-spill-";

pub struct SpillFile {
    file: NamedTempFile,
    writer: BufWriter<File>,
    hasher: Hasher,
    len: u64,
    checksum: Option<u32>,
}

impl SpillFile {
    /// Create a spill file in `dir`, or in the system temp directory
    pub fn create(dir: Option<&Path>) -> SpillResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let writer = BufWriter::new(file.as_file().try_clone()?);

        Logger::info(
            Event::SpillFileCreated,
            &[("path", file.path().display().to_string().as_str())],
        );
        MetricsRegistry::global().increment_spill_files();

        Ok(Self {
            file,
            writer,
            hasher: Hasher::new(),
            len: 0,
            checksum: None,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Bytes appended so far
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_finished(&self) -> bool {
        self.checksum.is_some()
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> SpillResult<()> {
        if self.checksum.is_some() {
            return Err(SpillError::Frozen);
        }
        self.writer.write_all(bytes)?;
        self.hasher.update(bytes);
        self.len += bytes.len() as u64;
        Ok(())
    }

    /// Flush buffered bytes and seal the checksum; idempotent
    pub fn finish(&mut self) -> SpillResult<u32> {
        if let Some(sum) = self.checksum {
            return Ok(sum);
        }
        self.writer.flush()?;
        let sum = self.hasher.clone().finalize();
        self.checksum = Some(sum);
        Ok(sum)
    }

    /// A fresh reader positioned at the start of the file
    pub fn reader(&self) -> SpillResult<SpillReader> {
        let expected = self.checksum.ok_or(SpillError::NotFrozen)?;
        let file = self.file.reopen()?;
        Ok(SpillReader {
            inner: BufReader::new(file).take(self.len),
            hasher: Hasher::new(),
            consumed: 0,
            len: self.len,
            expected,
        })
    }

    /// Raw copy of the sealed contents onto `out`
    pub fn copy_to(&self, out: &mut dyn Write) -> SpillResult<u64> {
        if self.checksum.is_none() {
            return Err(SpillError::NotFrozen);
        }
        let mut file = self.file.reopen()?;
        let copied = io::copy(&mut (&mut file).take(self.len), out)?;
        if copied != self.len {
            return Err(SpillError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("spill file shrank to {} of {} bytes", copied, self.len),
            )));
        }
        Ok(copied)
    }

    /// Truncate to empty and accept appends again
    pub fn clear(&mut self) -> SpillResult<()> {
        self.writer.flush()?;
        let mut handle = self.file.as_file().try_clone()?;
        handle.set_len(0)?;
        handle.seek(SeekFrom::Start(0))?;
        self.writer = BufWriter::new(handle);
        self.hasher = Hasher::new();
        self.len = 0;
        self.checksum = None;
        Ok(())
    }
}

/// Reader over a sealed spill file that checksums what it hands out
pub struct SpillReader {
    inner: io::Take<BufReader<File>>,
    hasher: Hasher,
    consumed: u64,
    len: u64,
    expected: u32,
}

impl SpillReader {
    /// Check that the whole file was consumed and its checksum matches
    pub fn verify(&self) -> SpillResult<()> {
        let actual = self.hasher.clone().finalize();
        if self.consumed != self.len || actual != self.expected {
            Logger::error(
                Event::SpillCorruption,
                &[
                    ("actual", format!("{:#010x}", actual).as_str()),
                    ("consumed", self.consumed.to_string().as_str()),
                    ("expected", format!("{:#010x}", self.expected).as_str()),
                    ("len", self.len.to_string().as_str()),
                ],
            );
            return Err(SpillError::Corrupt {
                expected: self.expected,
                actual,
            });
        }
        Ok(())
    }
}

impl Read for SpillReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.consumed += n as u64;
        Ok(n)
    }
}
