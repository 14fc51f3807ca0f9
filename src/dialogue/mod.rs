//! Trigger-driven dialogue playback.
//!
//! A [`DialogueTrigger`] component carries a bracket-tagged script and an
//! activation policy. The [`drive_triggers`] system watches occupancy edges
//! and the virtual "interact" action, and routes begin / advance / end calls
//! into the [`SessionArbiter`], which guarantees at most one conversation at
//! a time and reports every token to the [`EventBus`].
//!
//! Occupancy is written by the host: whatever collision or proximity test
//! the game uses sets [`DialogueTrigger::occupied`] each frame, and this
//! module derives the enter and exit edges from it.

pub mod arbiter;
pub mod script;
pub mod session;

use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::EventBus;
use crate::input::VirtualInput;

pub use arbiter::{AdvanceOutcome, BeginError, SessionArbiter};
pub use script::{tokenize, Token};
pub use session::DialogueSession;

pub struct DialoguePlugin;

impl Plugin for DialoguePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SessionArbiter>()
            .init_resource::<EventBus>()
            .init_resource::<VirtualInput>()
            .add_systems(Update, drive_triggers);
    }
}

/// Stable identity of a dialogue trigger, independent of ECS internals so
/// it can travel through event payloads and across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(pub u64);

impl TriggerId {
    pub fn from_entity(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a trigger starts and stops conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// Begin when an actor enters the zone, force-end when it leaves.
    ZoneCollision,
    /// Begin on the advance action while the zone is occupied; leaving
    /// the zone force-ends the conversation.
    #[default]
    KeyPress,
    /// Only explicit [`SessionArbiter`] calls start or stop this one.
    ProgrammaticOnly,
}

fn default_wait_time() -> Duration {
    Duration::from_millis(300)
}

fn default_advance_action() -> String {
    "interact".to_string()
}

/// A conversation source placed in the world.
///
/// The script text is kept verbatim and tokenized fresh on every
/// activation, so live edits (tooling, scripted swaps) take effect the
/// next time the trigger fires.
#[derive(Component, Clone, Serialize, Deserialize)]
pub struct DialogueTrigger {
    pub script: String,
    #[serde(default)]
    pub policy: ActivationPolicy,
    /// When set, the trigger works exactly once, even if that
    /// conversation is cut short.
    #[serde(default)]
    pub single_use: bool,
    /// Minimum gap between accepted advances within one conversation.
    #[serde(default = "default_wait_time")]
    pub wait_time: Duration,
    /// Virtual input action that advances (and, under
    /// [`ActivationPolicy::KeyPress`], starts) the conversation.
    #[serde(default = "default_advance_action")]
    pub advance_action: String,
    /// Host-written: whether an actor is inside the zone this frame.
    #[serde(skip)]
    pub occupied: bool,
    #[serde(skip)]
    was_occupied: bool,
}

impl DialogueTrigger {
    pub fn new(script: impl Into<String>, policy: ActivationPolicy) -> Self {
        Self {
            script: script.into(),
            policy,
            single_use: false,
            wait_time: default_wait_time(),
            advance_action: default_advance_action(),
            occupied: false,
            was_occupied: false,
        }
    }
}

/// Turns occupancy edges and advance presses into arbiter calls.
pub fn drive_triggers(
    time: Res<Time>,
    input: Res<VirtualInput>,
    mut arbiter: ResMut<SessionArbiter>,
    mut events: ResMut<EventBus>,
    mut triggers: Query<(Entity, &mut DialogueTrigger)>,
) {
    let now = time.elapsed();
    for (entity, mut trigger) in triggers.iter_mut() {
        let id = TriggerId::from_entity(entity);
        let entered = trigger.occupied && !trigger.was_occupied;
        let exited = !trigger.occupied && trigger.was_occupied;
        trigger.was_occupied = trigger.occupied;
        let advance_pressed = input.just_pressed(&trigger.advance_action);

        match trigger.policy {
            ActivationPolicy::ZoneCollision => {
                if entered {
                    begin_trigger(&mut arbiter, id, &trigger, &mut events);
                } else if exited {
                    arbiter.force_end(id, &mut events);
                } else if trigger.occupied && advance_pressed && arbiter.owner() == Some(id) {
                    arbiter.advance(id, now, &mut events);
                }
            }
            ActivationPolicy::KeyPress => {
                if exited {
                    arbiter.force_end(id, &mut events);
                } else if trigger.occupied && advance_pressed {
                    if arbiter.is_idle() {
                        begin_trigger(&mut arbiter, id, &trigger, &mut events);
                    } else if arbiter.owner() == Some(id) {
                        arbiter.advance(id, now, &mut events);
                    }
                }
            }
            ActivationPolicy::ProgrammaticOnly => {}
        }
    }
}

fn begin_trigger(
    arbiter: &mut SessionArbiter,
    id: TriggerId,
    trigger: &DialogueTrigger,
    events: &mut EventBus,
) {
    let tokens = tokenize(&trigger.script);
    if let Err(err) = arbiter.begin(id, trigger.single_use, trigger.wait_time, tokens, events) {
        debug!("dialogue trigger {id} not started: {err}");
    }
}
