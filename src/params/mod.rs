//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, seconds, degrees, etc.)
//! - Documented ranges and meanings
//! - Type safety where possible

mod control;
mod render;
mod simulation;

// Re-export all types
pub use control::{ControlConfig, FovTargets, PidGains, TimingConfig};
pub use render::RenderConfig;
pub use simulation::{EditorRates, GeoReference, InitialState, SimulationParams};
