pub mod engine;

pub use engine::{EngineConfig, Venue};
