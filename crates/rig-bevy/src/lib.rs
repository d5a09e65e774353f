//! Bevy scene synchronization for the external robot simulation.
//!
//! This crate is **Layer 1** of the viewer stack: it turns the flat model
//! and state tables of `rig-model` into a renderable Bevy hierarchy and
//! keeps it synchronized with the engine every step.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          rig-bevy (L1)                        │
//! │  ┌────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │ SceneBuild │  │  PoseSync    │  │ Tendon instance pools │  │
//! │  │  (once per │  │ (every step) │  │   (rebuilt per step)  │  │
//! │  │    load)   │  └──────┬───────┘  └───────────┬───────────┘  │
//! │  └─────┬──────┘         │                      │              │
//! └────────┼────────────────┼──────────────────────┼──────────────┘
//!          │ reads          │ reads                │ reads
//! ┌────────▼────────────────▼──────────────────────▼──────────────┐
//! │                      rig-model (L0)                           │
//! │   RawModel (static tables)      RawState (per-step arrays)    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Philosophy
//!
//! - The viewer is a window into the engine, never a second source of truth.
//! - Zero physics logic here; everything renderable derives from the tables.
//! - All engine/render coordinate knowledge lives in [`convert`].
//! - A failed build leaves no partial hierarchy: planning is pure and
//!   fallible, spawning is infallible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod convert;
pub mod material;
pub mod mesh;
pub mod plugin;
pub mod resources;
pub mod scene;
pub mod sync;
pub mod tendon;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::components::{BodyIndex, GeomVisual, LightIndex, SimSceneRoot, VisGroup};
    pub use crate::plugin::RigViewerPlugin;
    pub use crate::resources::{SimModel, SimState, ViewerConfig};
    pub use crate::scene::{build_scene, SceneBuildError, SpawnedScene};
    pub use crate::sync::PoseSyncSet;
    pub use crate::tendon::TENDON_POOL_CAPACITY;
}
