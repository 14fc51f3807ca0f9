use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

const MAX_EVENTS: usize = 256;

/// A fire-and-forget notification. Emitters never learn who (if anyone)
/// consumed it; consumers scan the bus with an [`EventCursor`].
#[derive(Serialize, Clone, Debug)]
pub struct GameEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub frame: u64,
    /// Entity bits or trigger id of the emitter, when one exists.
    pub source: Option<u64>,
}

/// Bounded notification sink shared by every component in this crate.
///
/// Oldest events fall off the front once the buffer is full; consumers that
/// poll at least once per frame never miss one in practice.
#[derive(Resource, Default)]
pub struct EventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped: u64,
    last_overflow_warn_frame: u64,
}

impl EventBus {
    pub fn emit(
        &mut self,
        name: impl Into<String>,
        data: serde_json::Value,
        source: Option<u64>,
    ) {
        self.recent.push_back(GameEvent {
            name: name.into(),
            data,
            frame: self.frame,
            source,
        });
        if self.recent.len() > MAX_EVENTS {
            self.recent.pop_front();
            self.dropped = self.dropped.saturating_add(1);
            if self.frame.saturating_sub(self.last_overflow_warn_frame) >= 60 {
                self.last_overflow_warn_frame = self.frame;
                warn!(
                    "event bus overflow: {} notifications dropped so far",
                    self.dropped
                );
            }
        }
    }

    /// Buffered events with the given name, oldest first.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a GameEvent> {
        self.recent.iter().filter(move |ev| ev.name == name)
    }
}

/// Read position into an [`EventBus`], so a consumer sees each event exactly
/// once even though the bus itself is a shared ring.
#[derive(Default, Clone)]
pub struct EventCursor {
    last_frame: u64,
    seen_in_frame: usize,
}

impl EventCursor {
    /// Events this cursor has not yet seen, oldest first. Advances the
    /// cursor past everything returned.
    pub fn fresh<'a>(&mut self, bus: &'a EventBus) -> Vec<&'a GameEvent> {
        let mut out = Vec::new();
        let mut count_in_frame = 0usize;
        for ev in bus.recent.iter() {
            if ev.frame < self.last_frame {
                continue;
            }
            if ev.frame == self.last_frame {
                count_in_frame = count_in_frame.saturating_add(1);
                if count_in_frame <= self.seen_in_frame {
                    continue;
                }
            } else {
                count_in_frame = 1;
            }
            self.last_frame = ev.frame;
            self.seen_in_frame = count_in_frame;
            out.push(ev);
        }
        out
    }
}

pub struct EventsPlugin;

impl Plugin for EventsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(EventBus::default())
            .add_systems(First, tick_event_frame);
    }
}

fn tick_event_frame(mut bus: ResMut<EventBus>) {
    bus.frame = bus.frame.saturating_add(1);
}
