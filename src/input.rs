use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

/// Abstraction layer between raw input and gameplay systems. Systems query
/// named actions; either the keyboard sync below or the host (headless
/// simulation, tests) writes them.
#[derive(Resource, Default, Clone)]
pub struct VirtualInput {
    pub active: HashSet<String>,
    pub just_pressed: HashSet<String>,
    pub just_released: HashSet<String>,
}

impl VirtualInput {
    pub fn pressed(&self, action: &str) -> bool {
        self.active.contains(action)
    }

    pub fn just_pressed(&self, action: &str) -> bool {
        self.just_pressed.contains(action)
    }

    /// Host-side injection: marks the action held and freshly pressed for
    /// the current frame.
    pub fn press(&mut self, action: &str) {
        self.active.insert(action.to_string());
        self.just_pressed.insert(action.to_string());
    }

    pub fn release(&mut self, action: &str) {
        self.active.remove(action);
        self.just_released.insert(action.to_string());
    }

    pub fn clear_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

/// Key bindings, action name to key codes. Hosts replace or extend the
/// default set wholesale.
#[derive(Resource, Clone)]
pub struct InputMap {
    pub bindings: HashMap<String, Vec<KeyCode>>,
}

impl Default for InputMap {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert("left".into(), vec![KeyCode::KeyA, KeyCode::ArrowLeft]);
        bindings.insert("right".into(), vec![KeyCode::KeyD, KeyCode::ArrowRight]);
        bindings.insert("up".into(), vec![KeyCode::KeyW, KeyCode::ArrowUp]);
        bindings.insert("down".into(), vec![KeyCode::KeyS, KeyCode::ArrowDown]);
        bindings.insert("jump".into(), vec![KeyCode::Space]);
        bindings.insert("attack".into(), vec![KeyCode::KeyJ]);
        bindings.insert("interact".into(), vec![KeyCode::KeyE, KeyCode::Enter]);
        Self { bindings }
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(VirtualInput::default())
            .insert_resource(InputMap::default())
            .add_systems(
                PreUpdate,
                keyboard_to_virtual.run_if(resource_exists::<ButtonInput<KeyCode>>),
            )
            .add_systems(Last, clear_virtual_input);
    }
}

/// Translate keyboard state into named actions per the current bindings.
fn keyboard_to_virtual(
    keyboard: Res<ButtonInput<KeyCode>>,
    map: Res<InputMap>,
    mut vinput: ResMut<VirtualInput>,
) {
    vinput.active.clear();
    vinput.just_pressed.clear();
    vinput.just_released.clear();

    for (action, keys) in map.bindings.iter() {
        if keys.iter().any(|k| keyboard.pressed(*k)) {
            vinput.active.insert(action.clone());
        }
        if keys.iter().any(|k| keyboard.just_pressed(*k)) {
            vinput.just_pressed.insert(action.clone());
        }
        if keys.iter().any(|k| keyboard.just_released(*k)) {
            vinput.just_released.insert(action.clone());
        }
    }
}

fn clear_virtual_input(mut vinput: ResMut<VirtualInput>) {
    vinput.clear_frame();
}
