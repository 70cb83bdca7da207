//! Progress sinks with terminal-once delivery

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::task::{Context, Poll};

use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::types::ProgressEvent;

/// Destination for a workflow's progress events.
///
/// Implementations deliver events in submission order. Once a terminal event
/// (success or failure) has been accepted, every later `emit` is dropped.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);

    /// Whether a terminal event has already been accepted.
    fn is_terminated(&self) -> bool;
}

/// Gate shared by the sinks: lets events through until a terminal one passes.
#[derive(Debug, Default)]
struct TerminalLatch {
    closed: AtomicBool,
}

impl TerminalLatch {
    fn admit(&self, event: &ProgressEvent) -> bool {
        if event.is_terminal() {
            !self.closed.swap(true, Ordering::SeqCst)
        } else {
            !self.closed.load(Ordering::SeqCst)
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Create a connected sink and consumer stream for one workflow.
pub fn progress_channel() -> (ProgressSink, ProgressStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let sink = ProgressSink {
        sender,
        latch: TerminalLatch::default(),
    };
    let stream = ProgressStream {
        inner: UnboundedReceiverStream::new(receiver),
        finished: false,
    };
    (sink, stream)
}

/// Channel-backed sink feeding a [`ProgressStream`].
#[derive(Debug)]
pub struct ProgressSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
    latch: TerminalLatch,
}

impl EventSink for ProgressSink {
    fn emit(&self, event: ProgressEvent) {
        if !self.latch.admit(&event) {
            tracing::debug!(?event, "Dropping event emitted after terminal event");
            return;
        }

        if self.sender.send(event).is_err() {
            tracing::debug!("Progress consumer is gone, event discarded");
        }
    }

    fn is_terminated(&self) -> bool {
        self.latch.is_closed()
    }
}

/// Consumer side of [`progress_channel`].
///
/// Yields events lazily in emission order and ends after the terminal event,
/// or when the sink is dropped without one. A finished stream stays finished.
#[derive(Debug)]
pub struct ProgressStream {
    inner: UnboundedReceiverStream<ProgressEvent>,
    finished: bool,
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Sink that keeps every accepted event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
    latch: TerminalLatch,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<ProgressEvent> {
        self.events
            .lock()
            .ok()
            .and_then(|events| events.last().cloned())
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        if !self.latch.admit(&event) {
            return;
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn is_terminated(&self) -> bool {
        self.latch.is_closed()
    }
}
