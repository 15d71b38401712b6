//! groundcam library - downward-camera ground-patch simulation

pub mod cli;
pub mod control;
pub mod geo;
pub mod geometry;
pub mod hud;
pub mod input;
pub mod params;
pub mod rendering;
pub mod sim;
