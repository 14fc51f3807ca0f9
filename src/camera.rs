use bevy::prelude::*;

/// Marks the transform the follow system steers. The host spawns its own
/// camera (or any stand-in transform in headless runs) and tags it.
#[derive(Component)]
pub struct MainCamera;

#[derive(Clone)]
pub struct FollowBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

#[derive(Resource, Clone)]
pub struct CameraFollow {
    pub target: Option<Entity>,
    /// Fraction of the remaining distance covered per frame at 60fps.
    pub speed: f32,
    pub offset: Vec2,
    /// Half-extents inside which target motion is ignored.
    pub deadzone: Vec2,
    pub bounds: Option<FollowBounds>,
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self {
            target: None,
            speed: 0.1,
            offset: Vec2::ZERO,
            deadzone: Vec2::new(8.0, 8.0),
            bounds: None,
        }
    }
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(CameraFollow::default())
            .add_systems(Update, camera_follow);
    }
}

/// Eases the camera toward its target: deadzone first, then bounds, then
/// the framerate-scaled lerp.
pub fn camera_follow(
    time: Res<Time>,
    follow: Res<CameraFollow>,
    targets: Query<&Transform, Without<MainCamera>>,
    mut cameras: Query<&mut Transform, With<MainCamera>>,
) {
    let Ok(mut cam_transform) = cameras.get_single_mut() else {
        return;
    };
    let Some(target_entity) = follow.target else {
        return;
    };
    let Ok(target_transform) = targets.get(target_entity) else {
        return;
    };

    let mut target = target_transform.translation.truncate() + follow.offset;
    let current = cam_transform.translation.truncate();
    if (target.x - current.x).abs() < follow.deadzone.x {
        target.x = current.x;
    }
    if (target.y - current.y).abs() < follow.deadzone.y {
        target.y = current.y;
    }

    if let Some(bounds) = &follow.bounds {
        target.x = target.x.clamp(bounds.min_x, bounds.max_x);
        target.y = target.y.clamp(bounds.min_y, bounds.max_y);
    }

    let speed = if follow.speed.is_finite() { follow.speed } else { 1.0 };
    let alpha = (speed * time.delta_secs() * 60.0).clamp(0.0, 1.0);
    let next = current.lerp(target, alpha);
    cam_transform.translation.x = next.x;
    cam_transform.translation.y = next.y;
}
