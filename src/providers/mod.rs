//! Capture provider implementations

pub mod replay;
pub mod simulation;

pub use replay::{DEFAULT_CHUNK_SAMPLES, ReplayProvider};
pub use simulation::SimulationProvider;
