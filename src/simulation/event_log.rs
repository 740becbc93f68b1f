//! Rolling log of notable tank events for display.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A logged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Tank time when the event occurred
    pub time: f32,
    /// Human-readable description of the event
    pub description: String,
    /// Category of the event
    pub kind: EventKind,
}

/// Event categories, used by renderers to pick a colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A protozoan split into offspring
    Split,
    /// A protozoan captured a mate's genome
    Mating,
    /// A protozoan died and decomposed
    Death,
    /// Offspring could not be expressed from their genome
    Miscarriage,
}

/// Event log keeping the most recent events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: VecDeque<LoggedEvent>,
    max_events: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(20)
    }
}

impl EventLog {
    /// Creates an empty log keeping at most `max_events` entries
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Adds a new event, dropping the oldest beyond capacity
    pub fn log(&mut self, time: f32, description: String, kind: EventKind) {
        self.events.push_front(LoggedEvent {
            time,
            description,
            kind,
        });
        self.events.truncate(self.max_events);
    }

    /// Returns all events, newest first
    pub fn events(&self) -> &VecDeque<LoggedEvent> {
        &self.events
    }

    /// Number of events held
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clears all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_newest_first() {
        let mut log = EventLog::new(2);
        log.log(0.0, "a".into(), EventKind::Split);
        log.log(1.0, "b".into(), EventKind::Death);
        log.log(2.0, "c".into(), EventKind::Mating);
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].description, "c");
        assert_eq!(log.events()[1].description, "b");
    }
}
