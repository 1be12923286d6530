//! Event subscription and dispatch
//!
//! The [`EventRouter`] is the surface a connection presents to subscriber
//! code. The connection layer drives it: once per inbound frame it calls
//! [`EventRouter::dispatch_frame`], and once per lifecycle transition
//! (connect, disconnect, authentication outcome, transport fault) it calls
//! [`EventRouter::dispatch_lifecycle`].
//!
//! Delivery mode for received frames is decided at dispatch time from the
//! registration table: a registered [`MessageHandler`] gets the payload as a
//! fully materialized buffer and always wins over a [`StreamHandler`], which
//! instead receives the live envelope and reads the source itself. With
//! neither registered the frame is dropped silently.
//!
//! Every handler invocation is fault-isolated: an `Err` return or a panic is
//! reported to the router's [`DiagnosticSink`] as a single line naming the
//! category and the originating connection, then discarded. A misbehaving
//! subscriber can never break the connection's frame processing. The only
//! error [`EventRouter::dispatch_frame`] surfaces is a materialization
//! failure, which means the connection's byte stream is no longer trustworthy
//! and must be escalated to the connection layer's disconnect path.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::envelope::FrameEnvelope;
use crate::error::{ClientError, Result};

/// Event categories a subscriber can register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// A frame arrived and is delivered as an owned payload buffer
    MessageReceived,
    /// A frame arrived and is delivered as a live byte source
    StreamReceived,
    /// The connection to the server was established
    Connected,
    /// The connection to the server was lost or closed
    Disconnected,
    /// The authentication exchange succeeded
    AuthenticationSucceeded,
    /// The authentication exchange failed
    AuthenticationFailed,
    /// The connection layer encountered an exception it wants surfaced
    Fault,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MessageReceived => "message-received",
            Self::StreamReceived => "stream-received",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::AuthenticationSucceeded => "authentication-succeeded",
            Self::AuthenticationFailed => "authentication-failed",
            Self::Fault => "fault",
        };
        f.write_str(name)
    }
}

/// Identifies the connection an event originated from
#[derive(Debug, Clone)]
pub struct EventContext {
    /// Unique connection identifier
    pub connection_id: Uuid,
    /// Remote endpoint address
    pub peer_addr: SocketAddr,
}

impl EventContext {
    /// Create a context for a new connection
    pub fn new(peer_addr: SocketAddr) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            peer_addr,
        }
    }
}

impl fmt::Display for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.peer_addr, self.connection_id)
    }
}

/// A fully materialized inbound message
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Frame metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// The complete payload
    pub payload: Bytes,
}

/// Connection lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Connected to the server
    Connected,
    /// Disconnected from the server
    Disconnected,
    /// Authentication succeeded
    AuthenticationSucceeded,
    /// Authentication failed
    AuthenticationFailed,
    /// The connection layer hit an exception worth reporting to subscribers
    Fault {
        /// Human-readable description of the fault
        detail: String,
    },
}

impl LifecycleEvent {
    /// The category this event dispatches under
    pub fn category(&self) -> EventCategory {
        match self {
            Self::Connected => EventCategory::Connected,
            Self::Disconnected => EventCategory::Disconnected,
            Self::AuthenticationSucceeded => EventCategory::AuthenticationSucceeded,
            Self::AuthenticationFailed => EventCategory::AuthenticationFailed,
            Self::Fault { .. } => EventCategory::Fault,
        }
    }
}

/// Error type handlers may return; always swallowed after being reported
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer of fully materialized messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one complete inbound message
    async fn handle_message(
        &self,
        ctx: &EventContext,
        message: InboundMessage,
    ) -> std::result::Result<(), HandlerError>;
}

/// Consumer of streamed frames.
///
/// The handler owns consumption of the envelope's source for the duration of
/// the call and should drain exactly the frame's remaining bytes before
/// returning; the envelope's frame-boundary cap prevents over-reads, and the
/// connection layer checks [`FrameEnvelope::remaining`] afterwards.
#[async_trait]
pub trait StreamHandler: Send + Sync {
    /// Handle one inbound frame with a live byte source
    async fn handle_stream(
        &self,
        ctx: &EventContext,
        frame: &mut FrameEnvelope<'_>,
    ) -> std::result::Result<(), HandlerError>;
}

/// Consumer of connection lifecycle events
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Handle one lifecycle event
    async fn handle_event(
        &self,
        ctx: &EventContext,
        event: LifecycleEvent,
    ) -> std::result::Result<(), HandlerError>;
}

/// A handler being registered for a category
#[derive(Clone)]
pub enum Subscriber {
    /// Message-mode consumer, valid for [`EventCategory::MessageReceived`]
    Message(Arc<dyn MessageHandler>),
    /// Stream-mode consumer, valid for [`EventCategory::StreamReceived`]
    Stream(Arc<dyn StreamHandler>),
    /// Lifecycle consumer, valid for the non-receive categories
    Lifecycle(Arc<dyn LifecycleHandler>),
}

impl Subscriber {
    fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Stream(_) => "stream",
            Self::Lifecycle(_) => "lifecycle",
        }
    }
}

/// Sink for one free-text diagnostic line per isolated handler fault
pub trait DiagnosticSink: Send + Sync {
    /// Record one fault line
    fn fault_line(&self, line: &str);
}

/// Default sink that forwards fault lines to `tracing`
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn fault_line(&self, line: &str) {
        warn!("{}", line);
    }
}

/// Per-category single-slot registration table
#[derive(Default)]
struct HandlerTable {
    message: Option<Arc<dyn MessageHandler>>,
    stream: Option<Arc<dyn StreamHandler>>,
    connected: Option<Arc<dyn LifecycleHandler>>,
    disconnected: Option<Arc<dyn LifecycleHandler>>,
    auth_succeeded: Option<Arc<dyn LifecycleHandler>>,
    auth_failed: Option<Arc<dyn LifecycleHandler>>,
    fault: Option<Arc<dyn LifecycleHandler>>,
}

impl HandlerTable {
    fn lifecycle_slot(&self, category: EventCategory) -> Option<&Option<Arc<dyn LifecycleHandler>>> {
        match category {
            EventCategory::Connected => Some(&self.connected),
            EventCategory::Disconnected => Some(&self.disconnected),
            EventCategory::AuthenticationSucceeded => Some(&self.auth_succeeded),
            EventCategory::AuthenticationFailed => Some(&self.auth_failed),
            EventCategory::Fault => Some(&self.fault),
            EventCategory::MessageReceived | EventCategory::StreamReceived => None,
        }
    }

    fn lifecycle_slot_mut(
        &mut self,
        category: EventCategory,
    ) -> Option<&mut Option<Arc<dyn LifecycleHandler>>> {
        match category {
            EventCategory::Connected => Some(&mut self.connected),
            EventCategory::Disconnected => Some(&mut self.disconnected),
            EventCategory::AuthenticationSucceeded => Some(&mut self.auth_succeeded),
            EventCategory::AuthenticationFailed => Some(&mut self.auth_failed),
            EventCategory::Fault => Some(&mut self.fault),
            EventCategory::MessageReceived | EventCategory::StreamReceived => None,
        }
    }
}

/// Per-connection subscription and dispatch surface.
///
/// Routers hold no state beyond the registration table and the diagnostic
/// sink, and each connection gets its own instance. Registration may happen
/// concurrently with in-flight dispatch from another thread; dispatch clones
/// the handler reference under the table lock and releases it before
/// awaiting the handler, so a registration change mid-dispatch never tears
/// the reference already being invoked.
pub struct EventRouter {
    table: RwLock<HandlerTable>,
    sink: Arc<dyn DiagnosticSink>,
}

impl EventRouter {
    /// Create a router reporting handler faults through `tracing`
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Create a router with an explicit diagnostic sink
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            table: RwLock::new(HandlerTable::default()),
            sink,
        }
    }

    fn table(&self) -> RwLockReadGuard<'_, HandlerTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn table_mut(&self) -> RwLockWriteGuard<'_, HandlerTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber for a category, replacing any existing one.
    ///
    /// Re-registration is last-wins. A subscriber variant that does not fit
    /// the category is rejected with [`ClientError::InvalidRegistration`].
    pub fn subscribe(&self, category: EventCategory, subscriber: Subscriber) -> Result<()> {
        let mut table = self.table_mut();
        match subscriber {
            Subscriber::Message(handler) if category == EventCategory::MessageReceived => {
                table.message = Some(handler);
            }
            Subscriber::Stream(handler) if category == EventCategory::StreamReceived => {
                table.stream = Some(handler);
            }
            Subscriber::Lifecycle(handler) => match table.lifecycle_slot_mut(category) {
                Some(slot) => *slot = Some(handler),
                None => {
                    return Err(ClientError::invalid_registration(format!(
                        "lifecycle handler does not fit category {category}"
                    )))
                }
            },
            subscriber => {
                return Err(ClientError::invalid_registration(format!(
                    "{} handler does not fit category {category}",
                    subscriber.kind()
                )))
            }
        }
        debug!("Registered {} subscriber", category);
        Ok(())
    }

    /// Remove the subscriber for a category, if any
    pub fn unsubscribe(&self, category: EventCategory) {
        let mut table = self.table_mut();
        match category {
            EventCategory::MessageReceived => table.message = None,
            EventCategory::StreamReceived => table.stream = None,
            _ => {
                if let Some(slot) = table.lifecycle_slot_mut(category) {
                    *slot = None;
                }
            }
        }
        debug!("Removed {} subscriber", category);
    }

    /// Whether a message-mode consumer is currently registered
    pub fn is_using_messages(&self) -> bool {
        self.table().message.is_some()
    }

    /// Whether a stream-mode consumer is currently registered
    pub fn is_using_streams(&self) -> bool {
        self.table().stream.is_some()
    }

    /// Dispatch one inbound frame, picking the delivery mode from the
    /// current registration state.
    ///
    /// Message mode wins when both receive handlers are registered; with
    /// neither registered the frame is dropped without error. Handler faults
    /// are isolated and reported to the sink. The only failure surfaced to
    /// the caller is a materialization failure
    /// ([`ClientError::TruncatedSource`] or [`ClientError::Io`]), which means
    /// the connection is broken.
    ///
    /// The envelope is returned so the connection layer can verify the frame
    /// was drained (see [`FrameEnvelope::remaining`]) before reading the next
    /// frame header.
    pub async fn dispatch_frame<'src>(
        &self,
        ctx: &EventContext,
        mut frame: FrameEnvelope<'src>,
    ) -> Result<FrameEnvelope<'src>> {
        let (message, stream) = {
            let table = self.table();
            (table.message.clone(), table.stream.clone())
        };

        if let Some(handler) = message {
            let payload = frame.materialize().await?;
            let inbound = InboundMessage {
                metadata: frame.metadata().clone(),
                payload,
            };
            self.isolate(
                EventCategory::MessageReceived,
                ctx,
                handler.handle_message(ctx, inbound),
            )
            .await;
        } else if let Some(handler) = stream {
            self.isolate(
                EventCategory::StreamReceived,
                ctx,
                handler.handle_stream(ctx, &mut frame),
            )
            .await;
        } else {
            debug!(
                "No receive subscriber registered, dropping {} byte frame from {}",
                frame.content_length(),
                ctx
            );
        }
        Ok(frame)
    }

    /// Dispatch one lifecycle event to its registered subscriber, if any.
    ///
    /// Never fails from the caller's perspective; handler faults are
    /// isolated and reported to the sink.
    pub async fn dispatch_lifecycle(&self, ctx: &EventContext, event: LifecycleEvent) {
        let category = event.category();
        let handler = self
            .table()
            .lifecycle_slot(category)
            .and_then(Clone::clone);
        match handler {
            Some(handler) => {
                self.isolate(category, ctx, handler.handle_event(ctx, event))
                    .await;
            }
            None => debug!("No {} subscriber registered for {}", category, ctx),
        }
    }

    /// Run one handler invocation inside the fault-isolation boundary.
    ///
    /// Both returned errors and panics end up as exactly one diagnostic line
    /// naming the category and the originating connection.
    async fn isolate<F>(&self, category: EventCategory, ctx: &EventContext, invocation: F)
    where
        F: Future<Output = std::result::Result<(), HandlerError>>,
    {
        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                self.sink
                    .fault_line(&format!("{category} handler failed for {ctx}: {error}"));
            }
            Err(panic) => {
                self.sink.fault_line(&format!(
                    "{category} handler panicked for {ctx}: {}",
                    panic_detail(panic.as_ref())
                ));
            }
        }
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table();
        f.debug_struct("EventRouter")
            .field("message", &table.message.is_some())
            .field("stream", &table.stream.is_some())
            .field("connected", &table.connected.is_some())
            .field("disconnected", &table.disconnected.is_some())
            .field("auth_succeeded", &table.auth_succeeded.is_some())
            .field("auth_failed", &table.auth_failed.is_some())
            .field("fault", &table.fault.is_some())
            .finish()
    }
}

fn panic_detail(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::AsyncReadExt;

    fn ctx() -> EventContext {
        EventContext::new("127.0.0.1:9000".parse().unwrap())
    }

    fn frame(content: &[u8]) -> FrameEnvelope<'static> {
        FrameEnvelope::new(
            None,
            content.len() as u64,
            Box::new(std::io::Cursor::new(content.to_vec())),
        )
    }

    #[derive(Default)]
    struct CollectingSink {
        lines: Mutex<Vec<String>>,
    }

    impl DiagnosticSink for CollectingSink {
        fn fault_line(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingMessageHandler {
        seen: Mutex<Vec<InboundMessage>>,
    }

    #[async_trait]
    impl MessageHandler for RecordingMessageHandler {
        async fn handle_message(
            &self,
            _ctx: &EventContext,
            message: InboundMessage,
        ) -> std::result::Result<(), HandlerError> {
            self.seen.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingStreamHandler {
        seen: Mutex<Vec<Vec<u8>>>,
        remaining_at_entry: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl StreamHandler for RecordingStreamHandler {
        async fn handle_stream(
            &self,
            _ctx: &EventContext,
            frame: &mut FrameEnvelope<'_>,
        ) -> std::result::Result<(), HandlerError> {
            self.remaining_at_entry.lock().unwrap().push(frame.remaining());
            let mut data = Vec::new();
            frame.read_to_end(&mut data).await?;
            self.seen.lock().unwrap().push(data);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingLifecycleHandler {
        seen: Mutex<Vec<LifecycleEvent>>,
    }

    #[async_trait]
    impl LifecycleHandler for RecordingLifecycleHandler {
        async fn handle_event(
            &self,
            _ctx: &EventContext,
            event: LifecycleEvent,
        ) -> std::result::Result<(), HandlerError> {
            self.seen.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct FailingMessageHandler;

    #[async_trait]
    impl MessageHandler for FailingMessageHandler {
        async fn handle_message(
            &self,
            _ctx: &EventContext,
            _message: InboundMessage,
        ) -> std::result::Result<(), HandlerError> {
            Err("subscriber exploded".into())
        }
    }

    struct PanickingMessageHandler;

    #[async_trait]
    impl MessageHandler for PanickingMessageHandler {
        async fn handle_message(
            &self,
            _ctx: &EventContext,
            _message: InboundMessage,
        ) -> std::result::Result<(), HandlerError> {
            panic!("subscriber panicked");
        }
    }

    #[tokio::test]
    async fn message_mode_wins_over_stream_mode() {
        let router = EventRouter::new();
        let message = Arc::new(RecordingMessageHandler::default());
        let stream = Arc::new(RecordingStreamHandler::default());
        router
            .subscribe(EventCategory::MessageReceived, Subscriber::Message(message.clone()))
            .unwrap();
        router
            .subscribe(EventCategory::StreamReceived, Subscriber::Stream(stream.clone()))
            .unwrap();

        let returned = router.dispatch_frame(&ctx(), frame(b"hello")).await.unwrap();

        let seen = message.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].payload.as_ref(), b"hello");
        assert!(stream.seen.lock().unwrap().is_empty());
        assert_eq!(returned.remaining(), 0);
    }

    #[tokio::test]
    async fn stream_mode_receives_live_source() {
        let router = EventRouter::new();
        let stream = Arc::new(RecordingStreamHandler::default());
        router
            .subscribe(EventCategory::StreamReceived, Subscriber::Stream(stream.clone()))
            .unwrap();

        let returned = router.dispatch_frame(&ctx(), frame(b"hello")).await.unwrap();

        assert_eq!(stream.remaining_at_entry.lock().unwrap().as_slice(), &[5]);
        assert_eq!(stream.seen.lock().unwrap()[0], b"hello");
        assert!(!returned.is_materialized());
        assert_eq!(returned.remaining(), 0);
    }

    #[tokio::test]
    async fn unhandled_frame_dropped_silently() {
        let sink = Arc::new(CollectingSink::default());
        let router = EventRouter::with_sink(sink.clone());

        let returned = router.dispatch_frame(&ctx(), frame(b"hello")).await.unwrap();

        assert!(sink.lines.lock().unwrap().is_empty());
        // Nothing consumed the payload; the connection layer sees that and
        // drains before the next header read.
        assert_eq!(returned.remaining(), 5);
    }

    #[tokio::test]
    async fn handler_error_is_isolated_and_logged_once() {
        let sink = Arc::new(CollectingSink::default());
        let router = EventRouter::with_sink(sink.clone());
        router
            .subscribe(
                EventCategory::MessageReceived,
                Subscriber::Message(Arc::new(FailingMessageHandler)),
            )
            .unwrap();

        let context = ctx();
        router.dispatch_frame(&context, frame(b"hello")).await.unwrap();

        let lines = sink.lines.lock().unwrap().clone();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("message-received"));
        assert!(lines[0].contains(&context.peer_addr.to_string()));
        assert!(lines[0].contains("subscriber exploded"));

        // A later, unrelated dispatch still works.
        let lifecycle = Arc::new(RecordingLifecycleHandler::default());
        router
            .subscribe(EventCategory::Connected, Subscriber::Lifecycle(lifecycle.clone()))
            .unwrap();
        router.dispatch_lifecycle(&context, LifecycleEvent::Connected).await;
        assert_eq!(lifecycle.seen.lock().unwrap().len(), 1);
        assert_eq!(sink.lines.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn handler_panic_is_isolated_and_logged_once() {
        let sink = Arc::new(CollectingSink::default());
        let router = EventRouter::with_sink(sink.clone());
        router
            .subscribe(
                EventCategory::MessageReceived,
                Subscriber::Message(Arc::new(PanickingMessageHandler)),
            )
            .unwrap();

        router.dispatch_frame(&ctx(), frame(b"hello")).await.unwrap();

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("panicked"));
        assert!(lines[0].contains("subscriber panicked"));
    }

    #[tokio::test]
    async fn truncated_materialization_escalates() {
        let router = EventRouter::new();
        let message = Arc::new(RecordingMessageHandler::default());
        router
            .subscribe(EventCategory::MessageReceived, Subscriber::Message(message.clone()))
            .unwrap();

        // Declares 10 bytes but the source only holds 4.
        let envelope = FrameEnvelope::new(
            None,
            10,
            Box::new(std::io::Cursor::new(vec![1u8, 2, 3, 4])),
        );
        let result = router.dispatch_frame(&ctx(), envelope).await;

        assert!(matches!(
            result,
            Err(ClientError::TruncatedSource {
                expected: 10,
                received: 4
            })
        ));
        assert!(message.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_subscriber_rejected() {
        let router = EventRouter::new();
        let result = router.subscribe(
            EventCategory::Connected,
            Subscriber::Message(Arc::new(RecordingMessageHandler::default())),
        );
        assert!(matches!(result, Err(ClientError::InvalidRegistration { .. })));

        let result = router.subscribe(
            EventCategory::MessageReceived,
            Subscriber::Lifecycle(Arc::new(RecordingLifecycleHandler::default())),
        );
        assert!(matches!(result, Err(ClientError::InvalidRegistration { .. })));
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let router = EventRouter::new();
        let first = Arc::new(RecordingMessageHandler::default());
        let second = Arc::new(RecordingMessageHandler::default());
        router
            .subscribe(EventCategory::MessageReceived, Subscriber::Message(first.clone()))
            .unwrap();
        router
            .subscribe(EventCategory::MessageReceived, Subscriber::Message(second.clone()))
            .unwrap();

        router.dispatch_frame(&ctx(), frame(b"hi")).await.unwrap();

        assert!(first.seen.lock().unwrap().is_empty());
        assert_eq!(second.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_falls_back_to_stream_mode() {
        let router = EventRouter::new();
        let message = Arc::new(RecordingMessageHandler::default());
        let stream = Arc::new(RecordingStreamHandler::default());
        router
            .subscribe(EventCategory::MessageReceived, Subscriber::Message(message.clone()))
            .unwrap();
        router
            .subscribe(EventCategory::StreamReceived, Subscriber::Stream(stream.clone()))
            .unwrap();

        router.unsubscribe(EventCategory::MessageReceived);
        assert!(!router.is_using_messages());
        assert!(router.is_using_streams());

        router.dispatch_frame(&ctx(), frame(b"hello")).await.unwrap();
        assert!(message.seen.lock().unwrap().is_empty());
        assert_eq!(stream.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lifecycle_events_route_to_their_category() {
        let router = EventRouter::new();
        let connected = Arc::new(RecordingLifecycleHandler::default());
        let auth_failed = Arc::new(RecordingLifecycleHandler::default());
        router
            .subscribe(EventCategory::Connected, Subscriber::Lifecycle(connected.clone()))
            .unwrap();
        router
            .subscribe(
                EventCategory::AuthenticationFailed,
                Subscriber::Lifecycle(auth_failed.clone()),
            )
            .unwrap();

        let context = ctx();
        router.dispatch_lifecycle(&context, LifecycleEvent::Connected).await;
        router
            .dispatch_lifecycle(&context, LifecycleEvent::AuthenticationFailed)
            .await;
        // No fault subscriber registered: silent no-op.
        router
            .dispatch_lifecycle(
                &context,
                LifecycleEvent::Fault {
                    detail: "keepalive write failed".to_string(),
                },
            )
            .await;

        assert_eq!(
            connected.seen.lock().unwrap().as_slice(),
            &[LifecycleEvent::Connected]
        );
        assert_eq!(
            auth_failed.seen.lock().unwrap().as_slice(),
            &[LifecycleEvent::AuthenticationFailed]
        );
    }

    #[tokio::test]
    async fn zero_length_frame_delivers_empty_payload() {
        let router = EventRouter::new();
        let message = Arc::new(RecordingMessageHandler::default());
        router
            .subscribe(EventCategory::MessageReceived, Subscriber::Message(message.clone()))
            .unwrap();

        router.dispatch_frame(&ctx(), frame(b"")).await.unwrap();

        let seen = message.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].payload.is_empty());
    }
}
