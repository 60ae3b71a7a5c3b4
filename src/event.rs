//! Highlight notifications.
//!
//! Each highlighter owns an [`EventBus`]. Hosts either register callbacks or
//! take a channel receiver and poll it from their own loop.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::highlight::{BatchReport, BlockId, Span};

/// Something the host may want to react to, typically by repainting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HighlightEvent {
    /// A block's spans changed.
    BlockHighlighted {
        index: usize,
        block: BlockId,
        spans: Vec<Span>,
    },
    /// A block left the document; its spans were discarded.
    BlockRemoved { block: BlockId },
    /// A scheduler pass completed.
    PassFinished(BatchReport),
}

type EventCallback = Box<dyn FnMut(&HighlightEvent) + Send + 'static>;

/// Fan-out of [`HighlightEvent`]s to callbacks and channels.
#[derive(Default)]
pub struct EventBus {
    callbacks: Vec<EventCallback>,
    channels: Vec<Sender<HighlightEvent>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked synchronously for every event.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&HighlightEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Create a channel that receives every subsequent event.
    ///
    /// Dropping the receiver unsubscribes it.
    pub fn subscribe_channel(&mut self) -> Receiver<HighlightEvent> {
        let (tx, rx) = mpsc::channel();
        self.channels.push(tx);
        rx
    }

    /// True if nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty() && self.channels.is_empty()
    }

    /// Deliver `event` to every subscriber.
    pub fn emit(&mut self, event: &HighlightEvent) {
        for callback in &mut self.callbacks {
            callback(event);
        }
        self.channels.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("callbacks", &self.callbacks.len())
            .field("channels", &self.channels.len())
            .finish()
    }
}
