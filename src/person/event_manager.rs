//! Per-person event queue: an ordered multimap keyed by absolute day (§4.7,
//! §9 "Event queues"). Events at the same time execute in insertion order,
//! so each bucket is a plain `Vec`, not a priority queue — days are small
//! integers and events are executed in bulk at day boundaries.
use super::event::PersonEvent;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct EventManager {
    queue: BTreeMap<i64, Vec<PersonEvent>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dropping an event scheduled in the past is an error; the
    /// caller (the event-constructing site) is responsible for never doing
    /// so. Defensively clamp here and let callers assert in debug builds.
    pub fn schedule(&mut self, time: i64, current_time: i64, event: PersonEvent) {
        debug_assert!(
            time >= current_time,
            "scheduled event time {time} precedes current time {current_time}"
        );
        self.queue.entry(time).or_default().push(event);
    }

    /// Pops and returns every event due at `current_time`, in insertion order.
    /// Does not see events scheduled for `current_time` *after* this call
    /// returns — callers that execute events which can themselves schedule
    /// more same-day events must call this repeatedly until it is empty.
    pub fn pop_due(&mut self, current_time: i64) -> Vec<PersonEvent> {
        self.queue.remove(&current_time).unwrap_or_default()
    }

    /// Cancels every pending event matching `predicate` without executing it
    /// (used for "cancel other pending progress-to-clinical events" and for
    /// the mass-cancellation on death).
    pub fn cancel_matching(&mut self, predicate: impl Fn(&PersonEvent) -> bool) {
        for events in self.queue.values_mut() {
            events.retain(|e| !predicate(e));
        }
        self.queue.retain(|_, events| !events.is_empty());
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
