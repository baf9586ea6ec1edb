//! Session events with a bounded ring buffer and passive listeners.
//!
//! The session records what it does (throws started and cancelled, forced
//! settles, resolved lines, completed figures) so callers can drive
//! telemetry or UI without polling state. Listeners are invoked as events
//! are recorded; the buffer keeps the most recent events for draining.

use std::time::Duration;

use crate::line::{Line, LinePosition};
use crate::settle::ThrowTicket;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DivinationEvent {
    /// A new, empty figure was started.
    FigureStarted,
    ThrowStarted {
        ticket: ThrowTicket,
        position: LinePosition,
    },
    /// A throw was abandoned before it settled; its result is discarded.
    ThrowCancelled { ticket: ThrowTicket },
    /// The settle timeout fired before every body came to rest.
    SettleForced {
        ticket: ThrowTicket,
        elapsed: Duration,
    },
    LineResolved {
        ticket: ThrowTicket,
        position: LinePosition,
        line: Line,
        forced: bool,
    },
    FigureCompleted {
        primary: u8,
        transformed: Option<u8>,
    },
}

/// Discriminant tag for event types, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FigureStarted,
    ThrowStarted,
    ThrowCancelled,
    SettleForced,
    LineResolved,
    FigureCompleted,
}

impl DivinationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DivinationEvent::FigureStarted => EventKind::FigureStarted,
            DivinationEvent::ThrowStarted { .. } => EventKind::ThrowStarted,
            DivinationEvent::ThrowCancelled { .. } => EventKind::ThrowCancelled,
            DivinationEvent::SettleForced { .. } => EventKind::SettleForced,
            DivinationEvent::LineResolved { .. } => EventKind::LineResolved,
            DivinationEvent::FigureCompleted { .. } => EventKind::FigureCompleted,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBuffer: pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<DivinationEvent>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
    /// Events overwritten before anyone read them.
    dropped: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: DivinationEvent) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were overwritten before being drained.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    fn oldest_index(&self) -> usize {
        if self.len < self.capacity() {
            (self.head + self.capacity() - self.len) % self.capacity()
        } else {
            self.head
        }
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &DivinationEvent> {
        let start = self.oldest_index();
        let cap = self.capacity();
        (0..self.len).filter_map(move |i| self.events[(start + i) % cap].as_ref())
    }

    /// Remove and return every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<DivinationEvent> {
        let start = self.oldest_index();
        let cap = self.capacity();
        let drained = (0..self.len)
            .filter_map(|i| self.events[(start + i) % cap].take())
            .collect();
        self.head = 0;
        self.len = 0;
        drained
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type PassiveListener = Box<dyn FnMut(&DivinationEvent) + Send>;

struct ListenerEntry {
    filter: Option<EventKind>,
    listener: PassiveListener,
}

/// Buffered events plus listeners.
pub struct EventLog {
    buffer: EventBuffer,
    listeners: Vec<ListenerEntry>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("buffer", &self.buffer)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Default number of buffered events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: EventBuffer::new(capacity),
            listeners: Vec::new(),
        }
    }

    /// Listen to every event.
    pub fn on_event(&mut self, listener: PassiveListener) {
        self.listeners.push(ListenerEntry {
            filter: None,
            listener,
        });
    }

    /// Listen to one kind of event.
    pub fn on_kind(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners.push(ListenerEntry {
            filter: Some(kind),
            listener,
        });
    }

    /// Deliver an event to listeners, then buffer it.
    pub fn record(&mut self, event: DivinationEvent) {
        let kind = event.kind();
        for entry in &mut self.listeners {
            if entry.filter.is_none_or(|k| k == kind) {
                (entry.listener)(&event);
            }
        }
        self.buffer.push(event);
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    pub fn iter(&self) -> impl Iterator<Item = &DivinationEvent> {
        self.buffer.iter()
    }

    pub fn drain(&mut self) -> Vec<DivinationEvent> {
        self.buffer.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn cancelled(n: u64) -> DivinationEvent {
        DivinationEvent::ThrowCancelled {
            ticket: ThrowTicket(n),
        }
    }

    #[test]
    fn buffer_keeps_order() {
        let mut buf = EventBuffer::new(4);
        for n in 0..3 {
            buf.push(cancelled(n));
        }
        let got: Vec<_> = buf.iter().cloned().collect();
        assert_eq!(got, vec![cancelled(0), cancelled(1), cancelled(2)]);
    }

    #[test]
    fn buffer_drops_oldest_when_full() {
        let mut buf = EventBuffer::new(2);
        for n in 0..5 {
            buf.push(cancelled(n));
        }
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.dropped_count(), 3);
        let got: Vec<_> = buf.iter().cloned().collect();
        assert_eq!(got, vec![cancelled(3), cancelled(4)]);
    }

    #[test]
    fn zero_capacity_clamped() {
        let buf = EventBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn drain_empties_buffer() {
        let mut buf = EventBuffer::new(3);
        for n in 0..4 {
            buf.push(cancelled(n));
        }
        let drained = buf.drain();
        assert_eq!(drained, vec![cancelled(1), cancelled(2), cancelled(3)]);
        assert!(buf.is_empty());
        buf.push(cancelled(9));
        assert_eq!(buf.iter().cloned().collect::<Vec<_>>(), vec![cancelled(9)]);
    }

    #[test]
    fn drained_events_are_not_counted_as_dropped() {
        let mut buf = EventBuffer::new(2);
        for round in 0..3 {
            buf.push(cancelled(round * 2));
            buf.push(cancelled(round * 2 + 1));
            assert_eq!(buf.drain().len(), 2);
        }
        assert_eq!(buf.total_written(), 6);
        assert_eq!(buf.dropped_count(), 0);

        buf.push(cancelled(6));
        buf.push(cancelled(7));
        buf.push(cancelled(8));
        assert_eq!(buf.dropped_count(), 1);
    }

    #[test]
    fn listeners_receive_filtered_events() {
        let mut log = EventLog::new(8);
        let all = Arc::new(Mutex::new(0usize));
        let started = Arc::new(Mutex::new(0usize));

        let all_c = Arc::clone(&all);
        log.on_event(Box::new(move |_| *all_c.lock().unwrap() += 1));
        let started_c = Arc::clone(&started);
        log.on_kind(
            EventKind::FigureStarted,
            Box::new(move |_| *started_c.lock().unwrap() += 1),
        );

        log.record(DivinationEvent::FigureStarted);
        log.record(cancelled(1));

        assert_eq!(*all.lock().unwrap(), 2);
        assert_eq!(*started.lock().unwrap(), 1);
        assert_eq!(log.iter().count(), 2);
    }
}
