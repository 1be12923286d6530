//! Inbound frame envelopes
//!
//! A [`FrameEnvelope`] represents one application-level message received off
//! the wire: the frame's metadata, its declared content length, and the
//! connection's remaining byte source. The connection layer constructs one
//! envelope per inbound frame after it has parsed and validated the header,
//! then hands it to the event router for dispatch.
//!
//! Payload delivery happens one of two ways:
//!  * eagerly, via [`FrameEnvelope::materialize`], which drains exactly the
//!    declared number of bytes into an owned buffer and caches it; or
//!  * lazily, by reading the envelope directly — it implements [`AsyncRead`]
//!    and is capped at the frame boundary, so a streaming consumer can never
//!    read into the next frame.
//!
//! The envelope borrows the connection's reader for the duration of one
//! dispatch call. [`FrameEnvelope::remaining`] lets the connection layer
//! detect a consumer that returned without draining the payload, which would
//! otherwise desynchronize the next frame boundary.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::settings::{Settings, DEFAULT_READ_CHUNK_SIZE};

/// Sequential byte source bound to the live connection for one frame.
///
/// Valid only until the frame is fully consumed or the connection is closed;
/// the lifetime ties the envelope to the connection layer's reader borrow.
pub type FrameSource<'src> = Box<dyn AsyncRead + Send + Unpin + 'src>;

/// One inbound application-level message
pub struct FrameEnvelope<'src> {
    /// Frame metadata; empty when the sender supplied none
    metadata: HashMap<String, String>,
    /// Exact number of payload bytes the consumer is entitled to read
    content_length: u64,
    /// Live byte source, positioned at the start of the payload
    source: FrameSource<'src>,
    /// Cached payload after the first materialization
    cached: Option<Bytes>,
    /// Payload bytes consumed from the source so far
    consumed: u64,
    /// Chunk size for materialization reads
    read_chunk_size: usize,
}

impl<'src> FrameEnvelope<'src> {
    /// Create an envelope for one inbound frame.
    ///
    /// `metadata` of `None` normalizes to an empty map. `content_length` must
    /// already be validated against protocol limits by the connection layer.
    pub fn new(
        metadata: Option<HashMap<String, String>>,
        content_length: u64,
        source: FrameSource<'src>,
    ) -> Self {
        Self {
            metadata: metadata.unwrap_or_default(),
            content_length,
            source,
            cached: None,
            consumed: 0,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    /// Create an envelope using the chunk size from [`Settings`]
    pub fn with_settings(
        metadata: Option<HashMap<String, String>>,
        content_length: u64,
        source: FrameSource<'src>,
        settings: &Settings,
    ) -> Self {
        Self::new(metadata, content_length, source).with_chunk_size(settings.read_chunk_size)
    }

    /// Override the materialization chunk size (clamped to at least 1 byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.read_chunk_size = chunk_size.max(1);
        self
    }

    /// Frame metadata
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Declared payload length in bytes
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Payload bytes consumed from the source so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Payload bytes not yet consumed from the source.
    ///
    /// After a dispatch returns, a non-zero value means the consumer did not
    /// drain the frame and the connection's next frame boundary is suspect.
    pub fn remaining(&self) -> u64 {
        self.content_length - self.consumed
    }

    /// Whether the payload has been materialized into the cached buffer
    pub fn is_materialized(&self) -> bool {
        self.cached.is_some()
    }

    /// Read the full payload into an owned buffer, caching the result.
    ///
    /// A zero content length yields an empty buffer without touching the
    /// source. Otherwise the source is drained in `read_chunk_size` chunks
    /// (smaller for the final partial chunk) until exactly
    /// [`content_length`](Self::content_length) bytes have been accumulated.
    /// Repeat calls return the cached buffer with no further IO.
    ///
    /// A source that runs dry early fails with
    /// [`ClientError::TruncatedSource`]; the connection layer must treat that
    /// as a broken connection, not a retryable condition.
    ///
    /// This is the only sanctioned way to consume a payload eagerly. A
    /// streaming consumer that already read part of the source must not call
    /// this; the reads here go through the envelope's own frame-boundary cap,
    /// so the call cannot corrupt the next frame, but it will collect only
    /// the leftover bytes and fail the exact-length check.
    pub async fn materialize(&mut self) -> Result<Bytes> {
        if let Some(cached) = &self.cached {
            return Ok(cached.clone());
        }
        if self.content_length == 0 {
            let empty = Bytes::new();
            self.cached = Some(empty.clone());
            return Ok(empty);
        }

        let mut accumulated = BytesMut::with_capacity(
            usize::try_from(self.content_length.min(self.read_chunk_size as u64))
                .unwrap_or(self.read_chunk_size),
        );
        let mut chunk = vec![0u8; self.read_chunk_size];

        while self.remaining() > 0 {
            let want = usize::try_from(self.remaining().min(self.read_chunk_size as u64))
                .unwrap_or(self.read_chunk_size);
            // Reads go through our own capped AsyncRead impl, which also
            // advances the consumed counter.
            let n = self.read(&mut chunk[..want]).await?;
            if n == 0 {
                return Err(ClientError::truncated(
                    self.content_length,
                    accumulated.len() as u64,
                ));
            }
            accumulated.extend_from_slice(&chunk[..n]);
        }

        if accumulated.len() as u64 != self.content_length {
            // Only reachable when a streaming consumer partially drained the
            // source before calling materialize.
            return Err(ClientError::truncated(
                self.content_length,
                accumulated.len() as u64,
            ));
        }

        debug!("Materialized {} byte payload", accumulated.len());
        let payload = accumulated.freeze();
        self.cached = Some(payload.clone());
        Ok(payload)
    }
}

impl std::fmt::Debug for FrameEnvelope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameEnvelope")
            .field("metadata", &self.metadata)
            .field("content_length", &self.content_length)
            .field("consumed", &self.consumed)
            .field("materialized", &self.cached.is_some())
            .finish_non_exhaustive()
    }
}

/// Streaming access to the payload, capped at the frame boundary.
///
/// EOF is reported once `content_length` bytes have been consumed, even if
/// the underlying connection has more data queued (that data belongs to the
/// next frame).
impl AsyncRead for FrameEnvelope<'_> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let left = this.content_length - this.consumed;
        if left == 0 || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        let limit = usize::try_from(left)
            .unwrap_or(usize::MAX)
            .min(buf.remaining());
        let unfilled = buf.initialize_unfilled_to(limit);
        let mut sub = ReadBuf::new(unfilled);
        match Pin::new(&mut this.source).poll_read(cx, &mut sub) {
            Poll::Ready(Ok(())) => {
                let n = sub.filled().len();
                buf.advance(n);
                this.consumed += n as u64;
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}
