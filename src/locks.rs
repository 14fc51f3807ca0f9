use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::{EventBus, EventCursor};

fn default_locked() -> bool {
    true
}

/// A barrier opened by a collected key with a matching tag.
///
/// The host's pickup code announces keys as `key_collected {tag}` bus
/// events; each event opens at most one lock, so two red doors need two
/// red keys.
#[derive(Component, Clone, Serialize, Deserialize)]
pub struct ItemLock {
    pub key_tag: String,
    #[serde(default = "default_locked")]
    pub locked: bool,
}

impl ItemLock {
    pub fn new(key_tag: impl Into<String>) -> Self {
        Self {
            key_tag: key_tag.into(),
            locked: true,
        }
    }
}

pub struct LocksPlugin;

impl Plugin for LocksPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventBus>()
            .add_systems(Update, try_unlock);
    }
}

pub fn try_unlock(
    mut cursor: Local<EventCursor>,
    mut events: ResMut<EventBus>,
    mut locks: Query<(Entity, &mut ItemLock)>,
) {
    let mut keys: Vec<String> = cursor
        .fresh(&events)
        .into_iter()
        .filter(|ev| ev.name == "key_collected")
        .filter_map(|ev| ev.data.get("tag").and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect();
    if keys.is_empty() {
        return;
    }

    let mut opened = Vec::new();
    for (entity, mut lock) in locks.iter_mut() {
        if !lock.locked {
            continue;
        }
        let Some(slot) = keys.iter().position(|tag| *tag == lock.key_tag) else {
            continue;
        };
        keys.swap_remove(slot);
        lock.locked = false;
        opened.push(entity.to_bits());
    }

    for lock_bits in opened {
        events.emit(
            "lock_opened",
            serde_json::json!({ "lock": lock_bits }),
            Some(lock_bits),
        );
    }
}
