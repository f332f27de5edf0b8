//! JSON-RPC framing codec for the language server's stdio transport.
//!
//! LSP uses `Content-Length: N\r\n\r\n{json}` framing over stdin/stdout.
//! [`FrameReader`] reads client messages, [`FrameWriter`] writes responses and
//! notifications.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Maximum frame size (16 MiB). `didOpen` and full-sync `didChange` carry the
/// whole document, so this bounds the largest document we accept.
const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Maximum bytes for the whole header block of one frame, terminator included.
const MAX_HEADER_BYTES: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected EOF while reading headers")]
    TruncatedHeaders,
    #[error("missing Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),
    #[error("Content-Length {0} exceeds maximum {max}", max = MAX_FRAME_BYTES)]
    FrameTooLarge(usize),
    #[error("frame headers exceed {max} bytes", max = MAX_HEADER_BYTES)]
    HeaderTooLarge,
    /// The frame was consumed in full but its body is not JSON. The stream is
    /// still in sync and reading may continue.
    #[error("frame body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("failed to serialize frame: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl CodecError {
    /// Whether the reader can keep going after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidJson(_))
    }
}

/// Value of a `Content-Length` header line, `None` for any other header.
fn content_length(line: &str) -> Result<Option<usize>, CodecError> {
    let Some((key, value)) = line.split_once(':') else {
        return Ok(None);
    };
    if !key.trim().eq_ignore_ascii_case("Content-Length") {
        return Ok(None);
    }
    let value = value.trim();
    value
        .parse()
        .map(Some)
        .map_err(|_| CodecError::InvalidContentLength(value.to_string()))
}

/// Reads JSON-RPC frames from an async reader.
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
    /// Returns `Ok(None)` on EOF between frames (client went away).
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>, CodecError> {
        let Some(length) = self.read_headers().await? else {
            return Ok(None);
        };

        if length > MAX_FRAME_BYTES {
            return Err(CodecError::FrameTooLarge(length));
        }

        let mut body = vec![0u8; length];
        self.reader.read_exact(&mut body).await?;

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(CodecError::InvalidJson)
    }

    async fn read_headers(&mut self) -> Result<Option<usize>, CodecError> {
        let mut length = None;
        let mut line = String::new();
        let mut remaining = MAX_HEADER_BYTES;

        loop {
            if remaining == 0 {
                return Err(CodecError::HeaderTooLarge);
            }
            line.clear();
            let read = (&mut self.reader)
                .take(remaining as u64)
                .read_line(&mut line)
                .await?;
            if read == 0 {
                // EOF is clean only before the first header byte.
                return if remaining == MAX_HEADER_BYTES {
                    Ok(None)
                } else {
                    Err(CodecError::TruncatedHeaders)
                };
            }
            remaining -= read;
            if !line.ends_with('\n') {
                return Err(if remaining == 0 {
                    CodecError::HeaderTooLarge
                } else {
                    CodecError::TruncatedHeaders
                });
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if let Some(value) = content_length(trimmed)? {
                length = Some(value);
            }
        }

        length.map(Some).ok_or(CodecError::MissingContentLength)
    }
}

/// Writes JSON-RPC frames to an async writer.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one frame and flush it.
    pub async fn write_frame(&mut self, msg: &serde_json::Value) -> Result<(), CodecError> {
        let body = serde_json::to_vec(msg).map_err(CodecError::Serialize)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
