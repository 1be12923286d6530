//! VORT Client Core
//!
//! Headless event core for VORT protocol clients. The connection layer
//! (dial/reconnect, wire handshake, TLS) lives elsewhere and consumes this
//! crate through two seams: it wraps each inbound frame in a
//! [`FrameEnvelope`] once the header is parsed, and pushes frames and
//! lifecycle transitions through an [`EventRouter`] that application code
//! subscribes to.
//!
//! Received frames are delivered in one of two modes, decided per frame from
//! the current subscriptions: message mode hands subscribers an owned,
//! fully-read payload buffer; stream mode hands them the live byte source to
//! read on demand. Subscriber code is fault-isolated — a handler error or
//! panic is reported and swallowed, never fed back into the connection's
//! frame processing.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vort_client_core::{
//!     EventCategory, EventContext, EventRouter, HandlerError, InboundMessage,
//!     MessageHandler, Subscriber,
//! };
//!
//! struct Printer;
//!
//! #[async_trait::async_trait]
//! impl MessageHandler for Printer {
//!     async fn handle_message(
//!         &self,
//!         _ctx: &EventContext,
//!         message: InboundMessage,
//!     ) -> Result<(), HandlerError> {
//!         println!("{} byte message", message.payload.len());
//!         Ok(())
//!     }
//! }
//!
//! let router = EventRouter::new();
//! router.subscribe(EventCategory::MessageReceived, Subscriber::Message(Arc::new(Printer)))?;
//! # Ok::<(), vort_client_core::ClientError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

/// Client error types
pub mod error;

/// Inbound frame envelopes and payload materialization
pub mod envelope;

/// Event subscription and dispatch
pub mod events;

/// Client settings
pub mod settings;

// Re-exports for convenience
pub use envelope::{FrameEnvelope, FrameSource};
pub use error::{ClientError, Result};
pub use events::{
    DiagnosticSink, EventCategory, EventContext, EventRouter, HandlerError, InboundMessage,
    LifecycleEvent, LifecycleHandler, MessageHandler, StreamHandler, Subscriber, TracingSink,
};
pub use settings::{Settings, DEFAULT_READ_CHUNK_SIZE};
