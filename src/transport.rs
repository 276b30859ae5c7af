//! Line-delimited JSON transport.
//!
//! Each JSON-RPC message is a single line terminated by `\n`. The same
//! transport wraps stdin/stdout on the server side and the child process's
//! stdout/stdin on the client side; it is generic over reader/writer so
//! tests can drive it from in-memory buffers.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::trace;

/// Maximum bytes per message (1 MiB).
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Transport failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("read failed: {0}")]
    Read(std::io::Error),
    #[error("write failed: {0}")]
    Write(std::io::Error),
    #[error("message too large: {0} bytes (limit {MAX_MESSAGE_BYTES})")]
    Oversized(usize),
    #[error("message is not valid UTF-8")]
    Encoding,
}

/// Reads and writes newline-delimited messages over a byte channel.
#[derive(Debug)]
pub struct LineTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    buf: Vec<u8>,
}

impl<R, W> LineTransport<R, W>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            buf: Vec::new(),
        }
    }

    /// Reads the next line. Returns `None` on EOF (channel closed).
    ///
    /// Blank lines come back as `Some` empty strings; callers skip them.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(TransportError::Read)?;

        if n == 0 {
            return Ok(None);
        }
        if n > MAX_MESSAGE_BYTES {
            return Err(TransportError::Oversized(n));
        }

        let line = std::str::from_utf8(&self.buf)
            .map_err(|_| TransportError::Encoding)?
            .trim()
            .to_string();

        trace!(len = line.len(), "read message");
        Ok(Some(line))
    }

    /// Writes one message line and flushes.
    pub async fn write_line(&mut self, message: &str) -> Result<(), TransportError> {
        trace!(len = message.len(), "writing message");

        self.writer
            .write_all(message.as_bytes())
            .await
            .map_err(TransportError::Write)?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::Write)?;
        self.writer.flush().await.map_err(TransportError::Write)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn read_single_line() {
        let reader = Cursor::new(b"{\"jsonrpc\":\"2.0\"}\n".to_vec());
        let mut transport = LineTransport::new(reader, Vec::new());

        let line = transport.read_line().await.expect("read");
        assert_eq!(line, Some("{\"jsonrpc\":\"2.0\"}".to_string()));
    }

    #[tokio::test]
    async fn read_eof_returns_none() {
        let reader = Cursor::new(Vec::<u8>::new());
        let mut transport = LineTransport::new(reader, Vec::new());

        let line = transport.read_line().await.expect("read");
        assert_eq!(line, None);
    }

    #[tokio::test]
    async fn write_appends_newline() {
        let reader = Cursor::new(Vec::<u8>::new());
        let mut transport = LineTransport::new(reader, Vec::new());

        transport.write_line("{\"ok\":true}").await.expect("write");

        let output = String::from_utf8(transport.writer.clone()).expect("utf8");
        assert_eq!(output, "{\"ok\":true}\n");
    }

    #[tokio::test]
    async fn read_multiple_lines() {
        let reader = Cursor::new(b"line1\nline2\n".to_vec());
        let mut transport = LineTransport::new(reader, Vec::new());

        assert_eq!(transport.read_line().await.unwrap(), Some("line1".into()));
        assert_eq!(transport.read_line().await.unwrap(), Some("line2".into()));
        assert_eq!(transport.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_line_is_empty_string() {
        let reader = Cursor::new(b"\n".to_vec());
        let mut transport = LineTransport::new(reader, Vec::new());

        assert_eq!(transport.read_line().await.unwrap(), Some(String::new()));
    }
}
