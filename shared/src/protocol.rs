//! Wire protocol: newline-delimited JSON frames
//!
//! Every message is a single JSON object with a `type` tag, terminated by
//! `\n`. [`FrameReader`] buffers the stream and cuts it at each terminator,
//! so a frame may arrive in pieces or several frames may arrive in one read.

use crate::world::Snapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
}

/// Messages sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// First frame on every connection
    Init { tank_id: u32, state: Snapshot },
    /// Periodic full-state broadcast
    State { data: Snapshot },
}

/// Messages sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Move {
        #[serde(default)]
        dx: f32,
        #[serde(default)]
        dy: f32,
        /// Keeps the current aim when omitted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        angle: Option<f32>,
    },
    Shoot,
    Restart,
}

/// Serializes a message and appends the frame terminator.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decodes one frame body (without the terminator).
pub fn decode_frame<T: DeserializeOwned>(line: &str) -> Result<T, ProtocolError> {
    Ok(serde_json::from_str(line)?)
}

/// Reads frames from any async byte stream
pub struct FrameReader<R> {
    inner: BufReader<R>,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            line: Vec::new(),
        }
    }

    /// Returns the next decoded frame.
    ///
    /// `Ok(None)` means the peer closed the stream; a trailing partial frame
    /// is discarded. Blank lines are skipped. A frame that fails to decode is
    /// returned as `Some(Err(..))`; the reader stays usable.
    pub async fn next_frame<T: DeserializeOwned>(
        &mut self,
    ) -> Result<Option<Result<T, ProtocolError>>, std::io::Error> {
        loop {
            self.line.clear();
            self.inner.read_until(b'\n', &mut self.line).await?;

            if self.line.pop() != Some(b'\n') {
                return Ok(None);
            }
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }

            if self.line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let frame = std::str::from_utf8(&self.line)
                .map_err(ProtocolError::from)
                .and_then(|text| decode_frame(text));
            return Ok(Some(frame));
        }
    }
}

/// Encodes and writes one frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = encode_frame(message)?;
    writer.write_all(&bytes).await?;
    Ok(())
}
