//! Per-click event counters and their wire encoding.
//!
//! # Design
//! The tracker exposes 30 numeric counters per click, addressed by index
//! and updated through URL parameters: `event<N>=<value>` assigns the
//! counter, `add_event<N>=<value>` adds to it. `Event` is the update
//! itself (kind + value); the index lives in the `Events` collection so
//! a slot can never disagree with the key it renders under.
//!
//! Indices are the wire numbers: `set(3, ...)` renders under `event3`.
//! Valid range is `0..30`, no translation.

use crate::error::PostbackError;

/// Number of event counters the tracker keeps per click.
pub const EVENT_SLOTS: usize = 30;

/// A single update to one event counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Assign the counter to this value (`event<N>=<value>`).
    Set(i64),
    /// Add this value to the counter (`add_event<N>=<value>`); negative
    /// values subtract.
    Add(i64),
}

impl Event {
    pub fn value(self) -> i64 {
        match self {
            Event::Set(v) | Event::Add(v) => v,
        }
    }

    /// Wire parameter name for this event at `index`, e.g. `add_event5`.
    pub fn key(self, index: u8) -> String {
        match self {
            Event::Set(_) => format!("event{index}"),
            Event::Add(_) => format!("add_event{index}"),
        }
    }

    /// Full wire parameter, e.g. `add_event5=-1`.
    pub fn param(self, index: u8) -> String {
        format!("{}={}", self.key(index), self.value())
    }
}

/// Fixed-capacity collection of event updates, one optional `Event` per
/// index in `0..30`.
///
/// Starts empty; slots are written through `set` and rendered in
/// ascending index order. A slot can only be written once unless the
/// caller forces an overwrite, which is how an idempotent re-issue is
/// expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Events {
    slots: [Option<Event>; EVENT_SLOTS],
}

impl Default for Events {
    fn default() -> Self {
        Self {
            slots: [None; EVENT_SLOTS],
        }
    }
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `event` at `index`.
    ///
    /// Fails with `IndexOutOfRange` if `index >= 30` and with
    /// `SlotAlreadySet` if the slot is occupied and `force` is false.
    /// With `force` the existing event is replaced.
    pub fn set(&mut self, index: u8, event: Event, force: bool) -> Result<(), PostbackError> {
        if usize::from(index) >= EVENT_SLOTS {
            return Err(PostbackError::IndexOutOfRange { index });
        }
        if self.slots[usize::from(index)].is_some() && !force {
            return Err(PostbackError::SlotAlreadySet { index });
        }
        self.slots[usize::from(index)] = Some(event);
        Ok(())
    }

    /// The event stored at `index`, or `None` for an empty or
    /// out-of-range slot.
    pub fn get(&self, index: u8) -> Option<Event> {
        self.slots.get(usize::from(index)).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Wire parameters for every occupied slot, ascending index order.
    /// Empty slots contribute nothing; an all-empty collection renders
    /// to an empty list.
    pub fn params(&self) -> Vec<String> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|ev| ev.param(i as u8)))
            .collect()
    }

    /// Event parameters joined with `&`, ready to append to a query
    /// string. Empty for an all-empty collection.
    pub fn query(&self) -> String {
        self.params().join("&")
    }
}
