//! The transport session actor.
//!
//! One spawned task owns the [`LinkFramer`], the pending request table and
//! the byte channel. Callers talk to it through an unbounded command queue;
//! the task multiplexes that queue, channel reads and the earliest timer
//! deadline with `tokio::select!`.
//!
//! ```text
//!  send() ──► Command::Send ─┐
//!  cancel() ─► Command::Cancel ┤     ┌────────────────────┐
//!  close() ──► Command::Close ─┼───► │  SessionTask       │ ◄── channel reads
//!                              │     │  LinkFramer        │ ──► channel writes
//!  timers ─────────────────────┘     │  pending: seq → tx │
//!                                    └────────────────────┘
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ember_ash::constants::MAX_DATA_LEN;
use ember_ash::{LinkError, LinkEvent, LinkFramer, LinkStats};
use ember_codec::ezsp::{decode_ezsp, header_for, CallbackType, EzspFramed, EzspHeader};
use ember_codec::{serialize_fields, CodecError, Frame, FrameId, FrameRegistry};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::completion::{Response, ResponseHandle};
use crate::config::SessionConfig;
use crate::error::SessionError;

/// Receives frames that match no pending request.
pub type UnsolicitedHandler = Box<dyn FnMut(&EzspFramed) + Send>;

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub requests_sent: u64,
    pub responses_matched: u64,
    pub request_timeouts: u64,
    pub requests_cancelled: u64,
    pub unsolicited: u64,
    pub unknown_frames: u64,
    pub decode_errors: u64,
    pub peer_resets: u64,
    pub link: LinkStats,
}

/// State shared between the task and the session handle.
#[derive(Debug, Default)]
struct Shared {
    open: bool,
    stats: SessionStats,
    last_received: Option<Instant>,
}

/// Work submitted to the session task.
pub(crate) enum Command {
    Send {
        request_id: u64,
        header: EzspHeader,
        body: Vec<u8>,
        timeout: Duration,
        reply: oneshot::Sender<Response>,
    },
    Cancel(u64),
    Subscribe(UnsolicitedHandler),
    Close(oneshot::Sender<()>),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Send {
                request_id, header, ..
            } => write!(f, "Send({}, frame 0x{:02X})", request_id, header.frame_id),
            Command::Cancel(id) => write!(f, "Cancel({})", id),
            Command::Subscribe(_) => f.write_str("Subscribe"),
            Command::Close(_) => f.write_str("Close"),
        }
    }
}

// ============================================================================
// Session handle
// ============================================================================

/// Request/response session with a radio dongle over a byte channel.
pub struct TransportSession {
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<Mutex<Shared>>,
    next_request_id: AtomicU64,
    config: SessionConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransportSession {
    /// Start a session on `channel` and wait for the link to connect.
    ///
    /// Must be called within a tokio runtime. The channel is owned by the
    /// session until [`TransportSession::close`].
    pub async fn open<C>(
        channel: C,
        registry: Arc<FrameRegistry>,
        config: SessionConfig,
    ) -> Result<Self, SessionError>
    where
        C: AsyncRead + AsyncWrite + Send + 'static,
    {
        config.validate()?;
        let link = LinkFramer::new(config.link.clone())
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

        let (reader, writer) = tokio::io::split(channel);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = oneshot::channel();
        let shared = Arc::new(Mutex::new(Shared::default()));

        let task = SessionTask {
            reader,
            writer,
            link,
            registry,
            modulus: config.sequence_modulus,
            read_buffer_size: config.read_buffer_size,
            commands: command_rx,
            pending: HashMap::new(),
            next_sequence: 0,
            handlers: Vec::new(),
            shared: Arc::clone(&shared),
            connected: false,
            on_connected: Some(connected_tx),
            running: true,
        };
        let handle = tokio::spawn(task.run());

        let session = TransportSession {
            commands,
            shared,
            next_request_id: AtomicU64::new(1),
            config,
            task: Mutex::new(Some(handle)),
        };

        match connected_rx.await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(err)) => {
                session.close().await;
                Err(err)
            }
            Err(_) => {
                session.close().await;
                Err(SessionError::Closed)
            }
        }
    }

    /// Send a frame and return a handle that completes with the response.
    ///
    /// The frame is serialized on the caller's thread, so encoding errors
    /// are returned here rather than through the handle.
    pub fn send(&self, frame: &dyn Frame, timeout: Duration) -> Result<ResponseHandle, SessionError> {
        let header = header_for(0, frame)?;
        let body = serialize_fields(frame)?;
        let length = ember_codec::ezsp::EZSP_HEADER_SIZE + body.len();
        if length > MAX_DATA_LEN {
            return Err(SessionError::FrameTooLarge {
                length,
                max: MAX_DATA_LEN,
            });
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(Command::Send {
                request_id,
                header,
                body,
                timeout,
                reply,
            })
            .map_err(|_| SessionError::Closed)?;
        Ok(ResponseHandle::new(
            request_id,
            receiver,
            self.commands.downgrade(),
        ))
    }

    /// Send a frame with the configured request timeout.
    pub fn request(&self, frame: &dyn Frame) -> Result<ResponseHandle, SessionError> {
        self.send(frame, self.config.request_timeout())
    }

    /// Register a handler for callbacks and frames no request is waiting for.
    ///
    /// Handlers run on the session task and must not block.
    pub fn subscribe<F>(&self, handler: F) -> Result<(), SessionError>
    where
        F: FnMut(&EzspFramed) + Send + 'static,
    {
        self.commands
            .send(Command::Subscribe(Box::new(handler)))
            .map_err(|_| SessionError::Closed)
    }

    /// Close the session. Pending requests fail with
    /// [`SessionError::Cancelled`]. Closing twice does nothing.
    pub async fn close(&self) {
        let Some(task) = self.task.lock().take() else {
            return;
        };
        let (done, closed) = oneshot::channel();
        if self.commands.send(Command::Close(done)).is_ok() {
            let _ = closed.await;
        }
        if let Err(err) = task.await {
            warn!("session task ended abnormally: {}", err);
        }
    }

    /// Check if the session task is running with a connected link.
    pub fn is_open(&self) -> bool {
        self.shared.lock().open
    }

    /// When the last frame was received from the dongle.
    pub fn last_received(&self) -> Option<Instant> {
        self.shared.lock().last_received
    }

    /// Snapshot of the session counters.
    pub fn stats(&self) -> SessionStats {
        self.shared.lock().stats
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSession")
            .field("open", &self.is_open())
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Session task
// ============================================================================

struct PendingRequest {
    request_id: u64,
    response_id: FrameId,
    /// `None` when the timeout is too long to represent.
    deadline: Option<Instant>,
    timeout: Duration,
    reply: oneshot::Sender<Response>,
}

impl PendingRequest {
    fn complete(self, response: Response) {
        // The caller may have dropped its handle.
        let _ = self.reply.send(response);
    }
}

struct SessionTask<C> {
    reader: ReadHalf<C>,
    writer: WriteHalf<C>,
    link: LinkFramer,
    registry: Arc<FrameRegistry>,
    modulus: u16,
    read_buffer_size: usize,
    commands: mpsc::UnboundedReceiver<Command>,
    pending: HashMap<u8, PendingRequest>,
    next_sequence: u16,
    handlers: Vec<UnsolicitedHandler>,
    shared: Arc<Mutex<Shared>>,
    connected: bool,
    on_connected: Option<oneshot::Sender<Result<(), SessionError>>>,
    running: bool,
}

impl<C> SessionTask<C>
where
    C: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn run(mut self) {
        let mut buf = vec![0u8; self.read_buffer_size];
        self.link.reset(Instant::now());

        while self.running {
            if let Err(err) = self.flush().await {
                self.shutdown(SessionError::Channel(err.to_string()));
                break;
            }
            self.publish_stats();

            let deadline = self.next_deadline();
            let sleep = async move {
                match deadline {
                    Some(deadline) => {
                        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
                    }
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                read = self.reader.read(&mut buf) => match read {
                    Ok(0) => {
                        debug!("channel reached end of stream");
                        self.shutdown(SessionError::Channel("channel closed".to_string()));
                    }
                    Ok(n) => {
                        trace!("read {} bytes", n);
                        self.link.receive(&buf[..n], Instant::now());
                        self.process_link_events();
                    }
                    Err(err) => {
                        warn!("channel read failed: {}", err);
                        self.shutdown(SessionError::Channel(err.to_string()));
                    }
                },
                command = self.commands.recv() => match command {
                    Some(Command::Close(done)) => {
                        self.shutdown(SessionError::Cancelled);
                        let _ = done.send(());
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("session handle dropped");
                        self.shutdown(SessionError::Cancelled);
                    }
                },
                _ = sleep => {
                    let now = Instant::now();
                    self.link.handle_timeout(now);
                    self.expire_requests(now);
                    self.process_link_events();
                }
            }
        }

        if let Err(err) = self.flush().await {
            debug!("final flush failed: {}", err);
        }
        self.link.close();
        if let Err(err) = self.writer.shutdown().await {
            debug!("channel shutdown failed: {}", err);
        }
        self.publish_stats();
        debug!("session task stopped");
    }

    async fn flush(&mut self) -> std::io::Result<()> {
        let mut wrote = false;
        while let Some(bytes) = self.link.poll_transmit() {
            self.writer.write_all(&bytes).await?;
            wrote = true;
        }
        if wrote {
            self.writer.flush().await?;
        }
        Ok(())
    }

    fn next_deadline(&self) -> Option<Instant> {
        let request = self.pending.values().filter_map(|p| p.deadline).min();
        match (self.link.poll_timeout(), request) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn publish_stats(&self) {
        let mut shared = self.shared.lock();
        shared.stats.link = self.link.stats();
        shared.open = self.running && self.connected;
    }

    // ========================================================================
    // Commands
    // ========================================================================

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Send {
                request_id,
                header,
                body,
                timeout,
                reply,
            } => self.start_request(request_id, header, body, timeout, reply),
            Command::Cancel(request_id) => self.cancel_request(request_id),
            Command::Subscribe(handler) => self.handlers.push(handler),
            Command::Close(done) => {
                let _ = done.send(());
            }
        }
    }

    fn start_request(
        &mut self,
        request_id: u64,
        mut header: EzspHeader,
        body: Vec<u8>,
        timeout: Duration,
        reply: oneshot::Sender<Response>,
    ) {
        if !self.connected {
            let _ = reply.send(Err(SessionError::Closed));
            return;
        }
        let Some(sequence) = self.allocate_sequence() else {
            let _ = reply.send(Err(SessionError::TooManyPending(self.modulus)));
            return;
        };

        header.sequence = sequence;
        let mut payload = Vec::with_capacity(ember_codec::ezsp::EZSP_HEADER_SIZE + body.len());
        header.encode(&mut payload);
        payload.extend_from_slice(&body);

        let now = Instant::now();
        if let Err(err) = self.link.send(&payload, now) {
            let _ = reply.send(Err(SessionError::LinkFailure(err)));
            return;
        }

        debug!(
            "request {} sent as sequence {} (frame 0x{:02X})",
            request_id, sequence, header.frame_id
        );
        let key = header.frame_key();
        self.pending.insert(
            sequence,
            PendingRequest {
                request_id,
                response_id: FrameId::new(key.group_id, key.command_id, key.direction.reverse()),
                deadline: now.checked_add(timeout),
                timeout,
                reply,
            },
        );
        self.shared.lock().stats.requests_sent += 1;
    }

    /// Next sequence number not held by a pending request.
    fn allocate_sequence(&mut self) -> Option<u8> {
        for _ in 0..self.modulus {
            let candidate = self.next_sequence;
            self.next_sequence = (candidate + 1) % self.modulus;
            if !self.pending.contains_key(&(candidate as u8)) {
                return Some(candidate as u8);
            }
        }
        None
    }

    fn cancel_request(&mut self, request_id: u64) {
        let sequence = self
            .pending
            .iter()
            .find(|(_, p)| p.request_id == request_id)
            .map(|(seq, _)| *seq);
        if let Some(pending) = sequence.and_then(|seq| self.pending.remove(&seq)) {
            debug!("request {} cancelled", request_id);
            self.shared.lock().stats.requests_cancelled += 1;
            pending.complete(Err(SessionError::Cancelled));
        }
    }

    fn expire_requests(&mut self, now: Instant) {
        let expired: Vec<u8> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline.is_some_and(|deadline| deadline <= now))
            .map(|(seq, _)| *seq)
            .collect();
        for sequence in expired {
            if let Some(pending) = self.pending.remove(&sequence) {
                debug!("request {} (sequence {}) timed out", pending.request_id, sequence);
                self.shared.lock().stats.request_timeouts += 1;
                let timeout_ms = pending.timeout.as_millis() as u64;
                pending.complete(Err(SessionError::RequestTimeout { timeout_ms }));
            }
        }
    }

    fn fail_pending(&mut self, err: &SessionError) {
        for (_, pending) in self.pending.drain() {
            pending.complete(Err(err.clone()));
        }
    }

    /// Stop the task loop, failing everything still waiting.
    fn shutdown(&mut self, err: SessionError) {
        if !self.running {
            return;
        }
        self.running = false;
        self.shared.lock().open = false;
        self.fail_pending(&err);
        if let Some(on_connected) = self.on_connected.take() {
            let _ = on_connected.send(Err(err));
        }
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    fn process_link_events(&mut self) {
        while let Some(event) = self.link.poll_event() {
            match event {
                LinkEvent::Connected { reset_code } => self.on_link_connected(reset_code),
                LinkEvent::Delivered(payload) => self.dispatch(&payload),
                LinkEvent::Failed(err) => {
                    warn!("link failed: {}", err);
                    self.shutdown(SessionError::LinkFailure(err));
                }
            }
        }
    }

    fn on_link_connected(&mut self, reset_code: u8) {
        if self.connected {
            warn!(
                "dongle reset the link (code 0x{:02X}), failing {} pending requests",
                reset_code,
                self.pending.len()
            );
            self.shared.lock().stats.peer_resets += 1;
            self.fail_pending(&SessionError::LinkFailure(LinkError::PeerReset {
                code: reset_code,
            }));
            return;
        }
        info!("link connected (reset code 0x{:02X})", reset_code);
        self.connected = true;
        self.shared.lock().open = true;
        if let Some(on_connected) = self.on_connected.take() {
            let _ = on_connected.send(Ok(()));
        }
    }

    fn dispatch(&mut self, payload: &[u8]) {
        self.shared.lock().last_received = Some(Instant::now());

        let framed = match decode_ezsp(payload, &self.registry) {
            Ok(framed) => framed,
            Err(CodecError::UnknownFrame(unknown)) => {
                warn!("dropping frame: {}", unknown);
                self.shared.lock().stats.unknown_frames += 1;
                return;
            }
            Err(err) => {
                warn!("dropping undecodable frame: {}", err);
                self.shared.lock().stats.decode_errors += 1;
                return;
            }
        };

        let sequence = framed.sequence();
        let matches = framed.header.callback_type() != CallbackType::Asynchronous
            && self
                .pending
                .get(&sequence)
                .is_some_and(|p| p.response_id == framed.frame_id());
        if matches {
            if let Some(pending) = self.pending.remove(&sequence) {
                trace!("response for request {}", pending.request_id);
                self.shared.lock().stats.responses_matched += 1;
                pending.complete(Ok(framed));
            }
            return;
        }

        trace!("unsolicited frame {}", framed.frame_id());
        self.shared.lock().stats.unsolicited += 1;
        if self.handlers.is_empty() {
            debug!("no handler for unsolicited frame {}", framed.frame_id());
        }
        for handler in self.handlers.iter_mut() {
            handler(&framed);
        }
    }
}
