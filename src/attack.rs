//! Projectile flight and melee swing windows.
//!
//! Both components only shape the timing of an attack; hit detection and
//! damage stay with the host, which reads [`MeleeStrike::is_active`] and
//! watches the bus for expiry events.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::EventBus;
use crate::input::VirtualInput;

pub struct AttackPlugin;

impl Plugin for AttackPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventBus>()
            .init_resource::<VirtualInput>()
            .add_systems(Update, (move_projectiles, drive_melee));
    }
}

/// Straight-line shot with a finite flight time.
#[derive(Component, Clone)]
pub struct Projectile {
    pub direction: Vec2,
    /// World units per second.
    pub speed: f32,
    /// Seconds of flight left.
    pub lifetime: f32,
}

pub fn move_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut events: ResMut<EventBus>,
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile)>,
) {
    let dt = time.delta_secs();
    for (entity, mut transform, mut proj) in projectiles.iter_mut() {
        let dir = if proj.direction.length_squared() > 0.0 {
            proj.direction.normalize()
        } else {
            Vec2::X
        };
        transform.translation.x += dir.x * proj.speed * dt;
        transform.translation.y += dir.y * proj.speed * dt;

        proj.lifetime -= dt;
        if proj.lifetime <= 0.0 {
            events.emit(
                "projectile_expired",
                serde_json::json!({ "projectile": entity.to_bits() }),
                Some(entity.to_bits()),
            );
            commands.entity(entity).despawn();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrikePhase {
    #[default]
    Ready,
    Windup,
    Active,
    Recovery,
}

fn default_attack_action() -> String {
    "attack".to_string()
}

/// A melee swing broken into windup, active and recovery windows.
///
/// The host's hit detection applies damage only while [`is_active`]
/// reports true.
///
/// [`is_active`]: MeleeStrike::is_active
#[derive(Component, Clone, Serialize, Deserialize)]
pub struct MeleeStrike {
    /// Seconds between the button press and the hit window.
    pub windup: f32,
    /// Seconds the hit window stays open.
    pub active: f32,
    /// Seconds before the next swing is accepted.
    pub recovery: f32,
    /// Virtual input action that starts a swing.
    #[serde(default = "default_attack_action")]
    pub action: String,
    #[serde(skip)]
    pub phase: StrikePhase,
    #[serde(skip)]
    phase_time: f32,
}

impl MeleeStrike {
    pub fn new(windup: f32, active: f32, recovery: f32) -> Self {
        Self {
            windup,
            active,
            recovery,
            action: default_attack_action(),
            phase: StrikePhase::Ready,
            phase_time: 0.0,
        }
    }

    /// Whether the hit window is currently open.
    pub fn is_active(&self) -> bool {
        self.phase == StrikePhase::Active
    }
}

pub fn drive_melee(
    time: Res<Time>,
    input: Res<VirtualInput>,
    mut events: ResMut<EventBus>,
    mut strikes: Query<(Entity, &mut MeleeStrike)>,
) {
    let dt = time.delta_secs();
    for (entity, mut strike) in strikes.iter_mut() {
        match strike.phase {
            StrikePhase::Ready => {
                if input.just_pressed(&strike.action) {
                    strike.phase = StrikePhase::Windup;
                    strike.phase_time = 0.0;
                    events.emit(
                        "melee_started",
                        serde_json::json!({ "attacker": entity.to_bits() }),
                        Some(entity.to_bits()),
                    );
                }
            }
            StrikePhase::Windup => {
                strike.phase_time += dt;
                if strike.phase_time >= strike.windup {
                    strike.phase = StrikePhase::Active;
                    strike.phase_time = 0.0;
                }
            }
            StrikePhase::Active => {
                strike.phase_time += dt;
                if strike.phase_time >= strike.active {
                    strike.phase = StrikePhase::Recovery;
                    strike.phase_time = 0.0;
                }
            }
            StrikePhase::Recovery => {
                strike.phase_time += dt;
                if strike.phase_time >= strike.recovery {
                    strike.phase = StrikePhase::Ready;
                    strike.phase_time = 0.0;
                    events.emit(
                        "melee_finished",
                        serde_json::json!({ "attacker": entity.to_bits() }),
                        Some(entity.to_bits()),
                    );
                }
            }
        }
    }
}
