//! Line-oriented I/O over the engine's standard streams.
//!
//! Both halves are generic over tokio's async I/O traits so the same code
//! runs against a child process or an in-memory pipe.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

/// Reads newline-terminated lines from the engine's stdout.
///
/// Blank lines are skipped and trailing `\r\n` is trimmed.
///
/// # Cancellation
///
/// [`read_line`](Self::read_line) is cancel safe: bytes of a partially
/// received line stay buffered and are completed by the next call.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: BufReader<R>,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buffer: Vec::with_capacity(256),
        }
    }

    /// Read the next non-empty line.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            let bytes_read = self
                .reader
                .read_until(b'\n', &mut self.buffer)
                .await
                .map_err(Error::io)?;

            if bytes_read == 0 && self.buffer.is_empty() {
                return Ok(None);
            }

            let line = String::from_utf8_lossy(&self.buffer)
                .trim_end_matches(|c: char| c == '\r' || c == '\n')
                .to_string();
            self.buffer.clear();

            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(line));
        }
    }
}

/// Writes command lines to the engine's stdin.
///
/// Lines are buffered by the OS pipe until [`flush`](Self::flush).
#[derive(Debug)]
pub struct LineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { writer: inner }
    }

    /// Write `line` followed by a newline.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(Error::io)?;
        self.writer.write_all(b"\n").await.map_err(Error::io)
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await.map_err(Error::io)
    }

    /// Close the write half, signalling EOF to the engine.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await.map_err(Error::io)
    }
}
