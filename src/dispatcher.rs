//! Message dispatcher
//!
//! Routes message batches to handlers registered per `(kind, status)`.
//! Handlers receive a mutable context (the state they act on) and the
//! message being handled.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::message::{is_valid_message, Message};

/// Message handler
pub type Handler<C> = Box<dyn FnMut(&mut C, &Message) + Send>;

/// Handlers for the statuses of one kind
pub struct StatusHandlers<C> {
    handlers: HashMap<String, Handler<C>>,
}

impl<C> StatusHandlers<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Add the handler for `status`
    pub fn on<F>(mut self, status: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(&mut C, &Message) + Send + 'static,
    {
        self.handlers.insert(status.into(), Box::new(handler));
        self
    }
}

impl<C> Default for StatusHandlers<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes messages by `(kind, status)`
pub struct Dispatcher<C> {
    handlers: HashMap<String, StatusHandlers<C>>,
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register the status handlers for `kind`
    ///
    /// Replaces whatever was registered for that kind before; statuses are
    /// never merged.
    pub fn set_handler(&mut self, kind: impl Into<String>, handlers: StatusHandlers<C>) {
        self.handlers.insert(kind.into(), handlers);
    }

    /// Dispatch a batch in order
    ///
    /// Invalid messages and messages without an exact `(kind, status)`
    /// match are skipped. A panicking handler is logged and does not stop
    /// the rest of the batch. Returns how many handlers completed.
    pub fn dispatch(&mut self, cx: &mut C, messages: &[Message]) -> usize {
        let mut handled = 0;
        for message in messages {
            if !is_valid_message(message) {
                continue;
            }
            let Some(handler) = self
                .handlers
                .get_mut(&message.kind)
                .and_then(|statuses| statuses.handlers.get_mut(&message.status))
            else {
                continue;
            };

            match panic::catch_unwind(AssertUnwindSafe(|| handler(cx, message))) {
                Ok(()) => handled += 1,
                Err(_) => error!(
                    "Handler for ({}, {}) panicked",
                    message.kind, message.status
                ),
            }
        }
        handled
    }
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}
