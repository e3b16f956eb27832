//! Stdio framing codec for the compiler server.
//!
//! The server's two directions are framed differently: requests go in as
//! one JSON object per line, while server output arrives as
//! `Content-Length: N\r\n\r\n{json}` frames. [`RequestWriter`] and
//! [`FrameReader`] cover the two halves.

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Maximum frame size (8 MiB). A whole-project reference listing can be
/// large, but anything beyond this is a protocol error, not data.
const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// Reads length-prefixed JSON frames from the server's stdout.
pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` on clean EOF (server exited between frames).
    /// EOF inside a frame's headers or body is an error, as are malformed
    /// headers and oversized frames.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };

        if content_length > MAX_FRAME_BYTES {
            bail!("Content-Length {content_length} exceeds maximum {MAX_FRAME_BYTES}");
        }

        let mut body = vec![0u8; content_length];
        self.reader
            .read_exact(&mut body)
            .await
            .context("reading frame body")?;

        // The server counts the trailing newline into Content-Length;
        // serde_json tolerates the trailing whitespace.
        let value = serde_json::from_slice(&body).context("parsing server frame")?;
        Ok(Some(value))
    }

    /// Consume header lines up to the blank separator and return the
    /// `Content-Length` value, or `None` on EOF before any header byte.
    async fn read_headers(&mut self) -> Result<Option<usize>> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_any_header_bytes = false;

        loop {
            line.clear();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .await
                .context("reading header line")?;

            if bytes_read == 0 {
                if saw_any_header_bytes {
                    bail!("unexpected EOF while reading headers");
                }
                return Ok(None);
            }
            saw_any_header_bytes = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some((key, value)) = trimmed.split_once(':')
                && key.eq_ignore_ascii_case("Content-Length")
            {
                content_length = Some(
                    value
                        .trim()
                        .parse()
                        .context("invalid Content-Length value")?,
                );
            }
            // Other headers are ignored.
        }

        match content_length {
            Some(len) => Ok(Some(len)),
            None => bail!("missing Content-Length header"),
        }
    }
}

/// Writes requests to the server's stdin, one JSON object per line.
pub struct RequestWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> RequestWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialize and send one request line.
    pub async fn write_request(&mut self, msg: &serde_json::Value) -> Result<()> {
        let mut body = serde_json::to_string(msg).context("serializing request")?;
        body.push('\n');

        self.writer
            .write_all(body.as_bytes())
            .await
            .context("writing request")?;
        self.writer.flush().await.context("flushing request")?;

        Ok(())
    }
}
