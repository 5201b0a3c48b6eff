//! Spatial projection of a reasoning-graph snapshot.
//!
//! [`Scene::build`] turns the latest snapshot into render-facing primitives:
//! one [`NodePrimitive`] per node at its engine-assigned position, one
//! [`EdgePrimitive`] per resolvable edge. The build is pure and complete -
//! every frame is constructed from scratch from the current snapshot, so a
//! stale primitive from a previous snapshot cannot survive into the next one.
//! Animation (active-node pulsing, idle auto-rotation) is a function of the
//! clock passed in, never of retained scene state.

mod build;
mod camera;
mod math;
mod palette;

pub use build::*;
pub use camera::*;
pub use math::*;
pub use palette::*;
