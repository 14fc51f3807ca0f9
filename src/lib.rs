//! Greybox gameplay building blocks for Bevy.
//!
//! The components a prototype needs before it becomes a real game:
//! trigger-driven dialogue, countdown timers, attack windows, a follow
//! camera, flickering lights and keyed locks. Each module ships its own
//! plugin; add the ones you want and wire them to your game through the
//! shared [`events::EventBus`] and [`input::VirtualInput`].
//!
//! - [`dialogue`]: bracket-tagged scripts played one token per key press
//! - [`events`]: bounded notification bus with per-consumer cursors
//! - [`input`]: named-action input facade, injectable from headless hosts
//! - [`timers`]: countdown components that fire bus events
//! - [`attack`]: projectile flight and melee swing windows
//! - [`camera`]: deadzoned, bounded follow camera
//! - [`lighting`]: glow data and intensity flicker
//! - [`locks`]: barriers opened by collected keys

pub mod attack;
pub mod camera;
pub mod dialogue;
pub mod events;
pub mod input;
pub mod lighting;
pub mod locks;
pub mod timers;
