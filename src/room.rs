//! Chat room
//!
//! Holds a bounded, FIFO-evicted history of chat log entries and notifies
//! listeners synchronously on every new entry.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::error::AppError;
use crate::message::ChatLogEntry;
use crate::types::ListenerId;

/// Default number of entries a room keeps
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Room listener
///
/// Receives the new entry and the history it was just appended to.
pub type Listener = Box<dyn FnMut(&ChatLogEntry, &MessageHistory) + Send>;

/// Count-bounded history, oldest first
#[derive(Debug, Clone)]
pub struct MessageHistory {
    entries: VecDeque<ChatLogEntry>,
    capacity: usize,
}

impl MessageHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Append, evicting from the front until within capacity
    pub fn push(&mut self, entry: ChatLogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Independent copy, oldest first
    pub fn capture(&self) -> Vec<ChatLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Chat room
///
/// Rooms share nothing: each owns its history and listeners.
pub struct ChatRoom {
    history: MessageHistory,
    listeners: Vec<(ListenerId, Listener)>,
}

impl ChatRoom {
    /// Create a room with the default history capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: MessageHistory::with_capacity(capacity),
            listeners: Vec::new(),
        }
    }

    /// Append an entry and notify every listener
    ///
    /// Listeners run in registration order, after the entry is in history
    /// and before this returns.
    pub fn add_log(&mut self, entry: ChatLogEntry) {
        info!("ChatRoom: {}> {}", entry.author, entry.text);
        self.history.push(entry.clone());

        for (_, listener) in self.listeners.iter_mut() {
            listener(&entry, &self.history);
        }
    }

    /// Register a listener
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChatLogEntry, &MessageHistory) + Send + 'static,
    {
        self.push_listener(Box::new(listener))
    }

    /// Register a listener that may be absent
    ///
    /// An absent listener is a wiring defect and is rejected.
    pub fn try_add_listener(&mut self, listener: Option<Listener>) -> Result<ListenerId, AppError> {
        let listener = listener.ok_or(AppError::MissingListener)?;
        Ok(self.push_listener(listener))
    }

    fn push_listener(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.push((id, listener));
        debug!("Listener {} added, total {}", id, self.listeners.len());
        id
    }

    /// Remove the listener registered as `id`
    ///
    /// Returns false if no such listener was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.listeners.len()
    }

    /// Copy of the current history, oldest first
    pub fn capture_message_history(&self) -> Vec<ChatLogEntry> {
        self.history.capture()
    }

    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for ChatRoom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn entry(i: usize) -> ChatLogEntry {
        ChatLogEntry::new("alice", format!("message {}", i))
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut room = ChatRoom::new();
        for i in 0..101 {
            room.add_log(entry(i));
        }

        let history = room.capture_message_history();
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        assert!(!history.contains(&entry(0)));
        assert_eq!(history.first(), Some(&entry(1)));
        assert_eq!(history.last(), Some(&entry(100)));
    }

    #[test]
    fn test_custom_capacity() {
        let mut room = ChatRoom::with_capacity(2);
        for i in 0..5 {
            room.add_log(entry(i));
        }
        assert_eq!(room.capture_message_history(), vec![entry(3), entry(4)]);
        assert_eq!(room.history().capacity(), 2);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing_but_still_notifies() {
        let seen = Arc::new(Mutex::new(0));
        let mut room = ChatRoom::with_capacity(0);
        let counter = seen.clone();
        room.add_listener(move |_, _| *counter.lock().unwrap() += 1);

        room.add_log(entry(0));
        assert!(room.history().is_empty());
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_capture_returns_a_copy() {
        let mut room = ChatRoom::new();
        room.add_log(entry(0));

        let mut snapshot = room.capture_message_history();
        snapshot.clear();
        snapshot.push(entry(99));

        assert_eq!(room.capture_message_history(), vec![entry(0)]);
    }

    #[test]
    fn test_every_listener_notified_once_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut room = ChatRoom::new();
        for name in ["first", "second", "third"] {
            let calls = calls.clone();
            room.add_listener(move |e: &ChatLogEntry, _: &MessageHistory| {
                calls.lock().unwrap().push((name, e.clone()))
            });
        }

        room.add_log(entry(7));

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![("first", entry(7)), ("second", entry(7)), ("third", entry(7))]
        );
    }

    #[test]
    fn test_listener_sees_entry_already_in_history() {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let mut room = ChatRoom::new();
        let sink = observed.clone();
        room.add_listener(move |_: &ChatLogEntry, history: &MessageHistory| {
            *sink.lock().unwrap() = history.capture();
        });

        room.add_log(entry(1));
        room.add_log(entry(2));

        assert_eq!(*observed.lock().unwrap(), vec![entry(1), entry(2)]);
    }

    #[test]
    fn test_remove_listener_removes_only_that_listener() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut room = ChatRoom::new();
        let a = calls.clone();
        let first = room.add_listener(move |_: &ChatLogEntry, _: &MessageHistory| {
            a.lock().unwrap().push("first")
        });
        let b = calls.clone();
        room.add_listener(move |_: &ChatLogEntry, _: &MessageHistory| {
            b.lock().unwrap().push("second")
        });

        assert!(room.remove_listener(first));
        room.add_log(entry(0));

        assert_eq!(*calls.lock().unwrap(), vec!["second"]);
        assert_eq!(room.listener_count(), 1);
    }

    #[test]
    fn test_remove_unknown_listener_is_noop() {
        let mut room = ChatRoom::new();
        let id = room.add_listener(|_: &ChatLogEntry, _: &MessageHistory| {});

        assert!(!room.remove_listener(ListenerId::new()));
        assert!(room.remove_listener(id));
        assert!(!room.remove_listener(id));
        assert_eq!(room.listener_count(), 0);
    }

    #[test]
    fn test_missing_listener_is_rejected() {
        let mut room = ChatRoom::new();
        assert!(matches!(
            room.try_add_listener(None),
            Err(AppError::MissingListener)
        ));

        let listener: Listener = Box::new(|_: &ChatLogEntry, _: &MessageHistory| {});
        assert!(room.try_add_listener(Some(listener)).is_ok());
        assert_eq!(room.listener_count(), 1);
    }

    #[test]
    fn test_rooms_are_independent() {
        let mut a = ChatRoom::new();
        let b = ChatRoom::new();
        a.add_log(entry(0));
        assert!(b.capture_message_history().is_empty());
    }
}
