use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

/// Reads newline-delimited JSON messages from a byte stream.
pub struct JsonLineReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> JsonLineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Next message, or `None` once the stream is closed. Blank lines are skipped.
    ///
    /// Lines are read as raw bytes, so a line that is not UTF-8 is a
    /// `CodecError::Json` for that line only and the stream stays usable.
    pub async fn read_message(&mut self) -> Result<Option<Value>, CodecError> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let bytes_read = self
                .reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(CodecError::Io)?;

            if bytes_read == 0 {
                return Ok(None);
            }

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            trace!("Raw inbound message: {}", String::from_utf8_lossy(trimmed));

            let message = serde_json::from_slice(trimmed).map_err(CodecError::Json)?;
            return Ok(Some(message));
        }
    }
}

/// Writes messages as one JSON document per line.
pub struct JsonLineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> JsonLineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<(), CodecError> {
        let json = serde_json::to_string(message).map_err(CodecError::Json)?;
        self.writer
            .write_all(json.as_bytes())
            .await
            .map_err(CodecError::Io)?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(CodecError::Io)?;
        self.writer.flush().await.map_err(CodecError::Io)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
