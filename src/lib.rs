//! # ZenParticles
//!
//! Gesture-driven particle art: a fixed population of points that
//! continuously morphs toward a target shape, breathing outward as the
//! hands open and scaling with the distance between them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use zenparticles::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     let config = Config::default()
//!         .with_particles(3000)
//!         .with_shape(ShapeArchetype::Saturn);
//!     Viewer::new(config).run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Shapes
//!
//! A [`ShapeArchetype`] names a target. Four are procedural (heart,
//! flower, Saturn, fireworks) and generated on demand by [`geometry`]. Two
//! are filled by a [`ShapeService`] from a text prompt; until a cloud
//! arrives they show a sphere.
//!
//! ### Targets
//!
//! The [`ShapeCache`] keeps one cloud per archetype. The
//! [`TargetResolver`] picks the cloud for the selected archetype and wraps
//! it to exactly the particle count, so a 200-point generated cloud still
//! drives 3000 particles.
//!
//! ### Animation
//!
//! Every frame [`ParticleField::step`] pulls each particle a fixed fraction
//! of the way toward its target slot, pushed outward by the current
//! tension and perturbed by a small wobble. The whole cloud spins slowly
//! and eases toward the signalled scale.
//!
//! ### Signals
//!
//! An [`InteractionSignal`] carries tension, scale and whether hands are
//! present. Producers (hand landmark replay or the pointer) publish into a
//! latest-value bus built by [`signal_bus`]; the frame loop only ever sees
//! the newest value.
//!
//! ## Controls
//!
//! | Input | Action |
//! |-------|--------|
//! | Left drag | Orbit the camera |
//! | 1-4 | Heart, Flower, Saturn, Fireworks |
//! | 5 | Generate the Buddha preset |
//! | 6 | Custom AI shape |
//! | C | Next colour |
//! | R | Reset cached shapes |
//! | Space | Pause |
//! | Esc | Quit |
//!
//! With the `egui` feature a control panel adds colour swatches, a hex
//! field and a prompt box.

pub mod animation;
pub mod archetype;
pub mod cache;
pub mod cloud;
pub mod config;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod gpu;
pub mod input;
#[cfg(feature = "egui")]
pub mod panel;
pub mod resolver;
pub mod sampling;
pub mod session;
pub mod signal;
pub mod source;
pub mod time;
mod viewer;
pub mod visuals;

pub use animation::{AnimationConfig, ParticleField};
pub use archetype::ShapeArchetype;
pub use cache::ShapeCache;
pub use cloud::PointCloud;
pub use config::Config;
pub use error::{CacheError, CloudError, ConfigError, GenerationError, GpuError, SourceError, ViewerError};
pub use generation::{GenerationOutcome, GenerationRequest, GenerationWorker, ShapeService};
pub use glam::{Vec2, Vec3};
pub use resolver::{Target, TargetResolver};
pub use session::Session;
pub use signal::{GestureReducer, HandLandmarks, InteractionSignal, ScalePolicy};
pub use source::{signal_bus, InputMode, LandmarkReplay, SignalPublisher, SignalReceiver};
pub use time::{FrameClock, FrameTime};
pub use viewer::Viewer;
pub use visuals::{BlendMode, Color, VisualConfig};
pub use zenparticles_derive::ShapeTag;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use zenparticles::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::{AnimationConfig, ParticleField};
    pub use crate::archetype::ShapeArchetype;
    pub use crate::cloud::PointCloud;
    pub use crate::config::Config;
    pub use crate::error::ViewerError;
    pub use crate::generation::{GenerationRequest, ShapeService};
    pub use crate::input::{ControlAction, Input, KeyCode, MouseButton};
    pub use crate::session::Session;
    pub use crate::signal::InteractionSignal;
    pub use crate::time::{FrameClock, FrameTime};
    pub use crate::viewer::Viewer;
    pub use crate::visuals::{BlendMode, Color, VisualConfig};
    pub use crate::{Vec2, Vec3};
    pub use zenparticles_derive::ShapeTag;
    #[cfg(feature = "egui")]
    pub use egui;
}
