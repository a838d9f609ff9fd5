//! Observability events emitted by drivers.
//!
//! The debug driver emits a [`QUERY_EVENT`] carrying the literal query text
//! every time it prepares a statement. Consumers plug in an [`EventSink`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Name of the event emitted when a query is prepared.
pub const QUERY_EVENT: &str = "query";

/// A named event with a text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event name, e.g. [`QUERY_EVENT`].
    pub name: &'static str,
    /// Event payload, e.g. the query text.
    pub payload: String,
}

impl Event {
    /// Creates a query event for `sql`.
    #[must_use]
    pub fn query(sql: impl Into<String>) -> Self {
        Self {
            name: QUERY_EVENT,
            payload: sql.into(),
        }
    }
}

/// Trait for consuming events.
pub trait EventSink: Send + Sync {
    /// Receives one event.
    fn emit(&self, event: Event);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        debug!(event = event.name, payload = %event.payload, "Driver event");
    }
}

/// Sends events through a standard mpsc channel.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Mutex<Sender<Event>>,
}

impl ChannelSink {
    /// Creates the sink and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, Receiver<Event>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: Event) {
        // A dropped receiver only means nobody is listening anymore.
        let _ = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(event);
    }
}

/// Stores every event for later inspection.
#[derive(Debug, Default)]
pub struct CollectorSink {
    events: Mutex<Vec<Event>>,
}

impl CollectorSink {
    /// Returns a copy of the events received so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the payloads of all events named `name`.
    pub fn payloads(&self, name: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.name == name)
            .map(|event| event.payload)
            .collect()
    }

    /// Number of events received.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no event was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink() {
        NullSink.emit(Event::query("SELECT 1"));
    }

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(Event::query("SELECT * FROM users"));
        sink.emit(Event::query("DELETE FROM users"));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, QUERY_EVENT);
        assert_eq!(events[1].payload, "DELETE FROM users");
    }

    #[test]
    fn test_channel_sink_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(Event::query("orphaned"));
    }

    #[test]
    fn test_collector_sink() {
        let sink = CollectorSink::default();
        assert!(sink.is_empty());

        sink.emit(Event::query("SELECT 1"));
        sink.emit(Event {
            name: "other",
            payload: String::from("ignored"),
        });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.payloads(QUERY_EVENT), vec!["SELECT 1"]);
    }
}
