use crate::models::{PositionEntry, PositionEvent, PositionEventKind, PositionSnapshot};

/// Tracks one account's position snapshot across polling cycles and derives
/// lifecycle events from each snapshot replacement.
///
/// Owned by the polling loop, which serializes cycles; the tracker itself is
/// single-writer state with no interior locking. Each tracked account gets
/// its own tracker, so independent monitors never interfere.
pub struct PositionTracker {
    previous: PositionSnapshot,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionTracker {
    /// Start with an empty snapshot; the first cycle reports every live
    /// position as opened. State does not survive a restart.
    pub fn new() -> Self {
        Self {
            previous: PositionSnapshot::new(),
        }
    }

    /// Diff `current` against the retained snapshot, emit lifecycle events,
    /// and replace the retained snapshot wholesale.
    ///
    /// Transitions per instrument:
    /// - absent before, nonzero now: `Opened`
    /// - size grew in magnitude: `Increased` with `delta = current - previous`
    ///   on the raw signed sizes
    /// - size reached exactly zero from a positive size: `Closed`
    /// - gone from the snapshot entirely: `Closed`, carrying the old detail
    ///
    /// Partial decreases and long/short sign flips emit nothing.
    pub fn apply_snapshot(&mut self, current: PositionSnapshot) -> Vec<PositionEvent> {
        let mut events = Vec::new();

        for (symbol, entry) in &current {
            match self.previous.get(symbol) {
                None => {
                    if entry.size != 0.0 {
                        events.push(PositionEvent {
                            kind: PositionEventKind::Opened,
                            symbol: symbol.clone(),
                            detail: entry.detail.clone(),
                            delta: None,
                        });
                    }
                }
                Some(prev) => {
                    if entry.size.abs() > prev.size.abs() {
                        events.push(PositionEvent {
                            kind: PositionEventKind::Increased,
                            symbol: symbol.clone(),
                            detail: entry.detail.clone(),
                            delta: Some(entry.size - prev.size),
                        });
                    } else if entry.size == 0.0 && prev.size > 0.0 {
                        events.push(PositionEvent {
                            kind: PositionEventKind::Closed,
                            symbol: symbol.clone(),
                            detail: entry.detail.clone(),
                            delta: None,
                        });
                    }
                }
            }
        }

        // Instruments that vanished from the snapshot count as closed
        for (symbol, prev) in &self.previous {
            if !current.contains_key(symbol) {
                events.push(PositionEvent {
                    kind: PositionEventKind::Closed,
                    symbol: symbol.clone(),
                    detail: prev.detail.clone(),
                    delta: None,
                });
            }
        }

        self.previous = current;
        events
    }

    /// Number of instruments in the retained snapshot
    pub fn tracked(&self) -> usize {
        self.previous.len()
    }

    pub fn is_tracking(&self, symbol: &str) -> bool {
        self.previous.contains_key(symbol)
    }
}
