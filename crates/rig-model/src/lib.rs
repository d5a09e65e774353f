//! Engine-facing model and state types.
//!
//! This crate is **Layer 0** of the viewer stack: it mirrors the external
//! simulation engine's flat, index-addressed tables and carries no renderer
//! types. The visualization layer (`rig-bevy`) reads these tables; the gait
//! controller (`rig-gait`) writes into the state's control buffer.
//!
//! # Memory Layout
//!
//! Arrays are dense, 0-based, and indexed by their respective IDs:
//! - `geom_*` arrays indexed by `geom_id` (3- and 4-wide arrays are flat,
//!   `3 * id` / `4 * id` addressing)
//! - `mat_*` arrays indexed by `mat_id`, `tex_*` by `tex_id`, `mesh_*` by
//!   `mesh_id`, `light_*` by `light_id`, `actuator_*` by `actuator_id`
//! - entity names live in a single null-delimited blob addressed by
//!   per-entity offset tables
//!
//! The model is immutable after loading; the state is overwritten by the
//! engine every step.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod factories;
pub mod model;
pub mod state;

pub use model::{GeomKind, ModelIntegrityError, RawModel};
pub use state::RawState;
