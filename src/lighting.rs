use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};
use serde::{Deserialize, Serialize};

/// Per-entity glow data. Rendering is the host's problem; the sync below
/// only paints a sibling `Sprite` when one exists.
#[derive(Component, Clone, Serialize, Deserialize)]
pub struct PointGlow {
    pub color: [f32; 3],
    pub intensity: f32,
    pub radius: f32,
}

fn default_flicker_speed() -> f32 {
    8.0
}

/// Makes a glow waver around the intensity it had when flickering began.
#[derive(Component, Clone, Serialize, Deserialize)]
pub struct Flicker {
    /// Maximum intensity deviation in either direction.
    pub amplitude: f32,
    /// Jitter updates per second.
    #[serde(default = "default_flicker_speed")]
    pub speed: f32,
    #[serde(skip)]
    base_intensity: Option<f32>,
    #[serde(skip)]
    countdown: f32,
}

impl Flicker {
    pub fn new(amplitude: f32, speed: f32) -> Self {
        Self {
            amplitude,
            speed,
            base_intensity: None,
            countdown: 0.0,
        }
    }
}

/// Shared jitter source, seeded so headless runs are reproducible.
#[derive(Resource)]
pub struct FlickerRng(SmallRng);

impl Default for FlickerRng {
    fn default() -> Self {
        Self(SmallRng::seed_from_u64(7))
    }
}

pub struct LightingPlugin;

impl Plugin for LightingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FlickerRng>()
            .add_systems(Update, (flicker_lights, sync_glow_sprites).chain());
    }
}

pub fn flicker_lights(
    time: Res<Time>,
    mut rng: ResMut<FlickerRng>,
    mut lights: Query<(&mut PointGlow, &mut Flicker)>,
) {
    let dt = time.delta_secs();
    for (mut glow, mut flicker) in lights.iter_mut() {
        // Latch the resting intensity so jitter never compounds.
        let base = *flicker.base_intensity.get_or_insert(glow.intensity);
        if flicker.speed <= 0.0 || flicker.amplitude <= 0.0 {
            continue;
        }
        flicker.countdown -= dt;
        if flicker.countdown > 0.0 {
            continue;
        }
        flicker.countdown = 1.0 / flicker.speed;
        let jitter = (rng.0.gen::<f32>() - 0.5) * 2.0 * flicker.amplitude;
        glow.intensity = (base + jitter).max(0.0);
    }
}

pub fn sync_glow_sprites(mut lights: Query<(&PointGlow, &mut Sprite)>) {
    for (glow, mut sprite) in lights.iter_mut() {
        sprite.color = Color::srgba(
            glow.color[0] * glow.intensity,
            glow.color[1] * glow.intensity,
            glow.color[2] * glow.intensity,
            glow.intensity.clamp(0.0, 1.0),
        );
    }
}
