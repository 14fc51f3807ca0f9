use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::EventBus;

fn default_timer_event() -> String {
    "timer_elapsed".to_string()
}

/// Fires a bus event when its duration runs out.
///
/// One-shot timers lose the component on expiry; repeating timers rewind
/// and keep going. At most one firing per frame, so an oversized delta
/// catches up across the following frames instead of bursting.
#[derive(Component, Clone, Serialize, Deserialize)]
pub struct CountdownTimer {
    /// Seconds until the event fires.
    pub duration: f32,
    #[serde(skip)]
    pub elapsed: f32,
    #[serde(default)]
    pub repeating: bool,
    #[serde(default)]
    pub paused: bool,
    /// Bus event name emitted on expiry.
    #[serde(default = "default_timer_event")]
    pub event_name: String,
}

impl CountdownTimer {
    pub fn new(duration: f32, event_name: impl Into<String>) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            repeating: false,
            paused: false,
            event_name: event_name.into(),
        }
    }

    pub fn repeating(duration: f32, event_name: impl Into<String>) -> Self {
        Self {
            repeating: true,
            ..Self::new(duration, event_name)
        }
    }
}

pub struct TimersPlugin;

impl Plugin for TimersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventBus>()
            .add_systems(Update, tick_timers);
    }
}

pub fn tick_timers(
    mut commands: Commands,
    time: Res<Time>,
    mut events: ResMut<EventBus>,
    mut timers: Query<(Entity, &mut CountdownTimer)>,
) {
    let dt = time.delta_secs();
    for (entity, mut timer) in timers.iter_mut() {
        if timer.paused || timer.duration <= 0.0 {
            continue;
        }
        timer.elapsed += dt;
        if timer.elapsed < timer.duration {
            continue;
        }
        events.emit(
            timer.event_name.clone(),
            serde_json::json!({ "timer": entity.to_bits() }),
            Some(entity.to_bits()),
        );
        if timer.repeating {
            timer.elapsed -= timer.duration;
        } else {
            commands.entity(entity).remove::<CountdownTimer>();
        }
    }
}
