//! Completion handles for in-flight requests.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use ember_codec::ezsp::EzspFramed;
use tokio::sync::{mpsc, oneshot};

use crate::error::SessionError;
use crate::session::Command;

/// Outcome of a request.
pub type Response = Result<EzspFramed, SessionError>;

/// The response slot of one request.
///
/// Await it, block on it with [`ResponseHandle::wait_blocking`], or poll it
/// with [`ResponseHandle::try_result`]. The slot completes exactly once.
#[derive(Debug)]
pub struct ResponseHandle {
    request_id: u64,
    receiver: oneshot::Receiver<Response>,
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl ResponseHandle {
    pub(crate) fn new(
        request_id: u64,
        receiver: oneshot::Receiver<Response>,
        commands: mpsc::WeakUnboundedSender<Command>,
    ) -> Self {
        ResponseHandle {
            request_id,
            receiver,
            commands,
        }
    }

    /// Session-unique id of the request.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Take the outcome if the request has completed.
    ///
    /// Returns `None` while the request is pending. The outcome is handed
    /// out once; later calls report [`SessionError::Closed`].
    pub fn try_result(&mut self) -> Option<Response> {
        match self.receiver.try_recv() {
            Ok(response) => Some(response),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(SessionError::Closed)),
        }
    }

    /// Block the current thread until the request completes.
    ///
    /// Must not be called from within an async runtime.
    pub fn wait_blocking(self) -> Response {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(SessionError::Closed))
    }

    /// Stop waiting for the response.
    ///
    /// A pending request completes with [`SessionError::Cancelled`] and any
    /// late response is delivered as unsolicited. Does nothing if the request
    /// already completed or the session is gone.
    pub fn cancel(&self) {
        if let Some(commands) = self.commands.upgrade() {
            let _ = commands.send(Command::Cancel(self.request_id));
        }
    }
}

impl Future for ResponseHandle {
    type Output = Response;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(SessionError::Closed)))
    }
}
