#![forbid(unsafe_code)]

//! Real-time marker declutter engine.
//!
//! Map markers are circles whose radii grow with the data they show. Every frame, `remora`
//! pulls each marker toward the pixel projection of its geographic anchor and pushes
//! overlapping circles apart, so clusters stay legible while the map pans and zooms. A small
//! pointer state machine lets the user drag one marker at a time without the map panning
//! underneath, and tells clicks apart from drags.
//!
//! The crate is headless: the host supplies a [`Projection`] for the current viewport,
//! forwards zoom start/end and pointer events, and receives marker moves through a
//! [`RenderSink`] plus [`InteractionEffect`]s.
//!
//! # Usage
//! ```ignore
//! let mut sim = Simulation::default();
//! let station = sim.register("BR-042", LatLng::new(48.3, -3.35))?;
//! sim.set_target_radius("BR-042", 14.0)?;
//!
//! // Each frame:
//! sim.tick(&map_projection, &mut |id: &NodeId, px: ScreenPoint| move_marker(id, px));
//! ```

pub mod config;
pub mod error;
pub mod geom;
pub mod interaction;
pub mod projection;
pub mod registry;
pub mod simulation;
pub mod sink;
pub mod solver;

pub use config::{InteractionConfig, RemoraConfig, SolverConfig};
pub use error::{Error, Result};
pub use geom::{LatLng, ScreenPoint, ScreenSpace, ScreenVector, point, vector};
pub use interaction::{GestureState, InteractionController, InteractionEffect, PointerEvent};
pub use projection::Projection;
pub use registry::{Node, NodeHandle, NodeId, NodeRegistry};
pub use simulation::Simulation;
pub use sink::{PositionUpdate, RenderSink};
pub use solver::{TickOutcome, TickReport};
