//! Pre-confirmation swap-simulation and opportunity-detection kernel.
//!
//! The account store, hot-path cache, speculative-state manager, and
//! opportunity detector are the core pipeline; `decode`, `math`, and
//! `dex` supply the per-venue account parsing and swap math they sit
//! on top of. Streaming feeds, transaction construction, and bundle
//! submission are out of scope — this crate stops at producing an
//! `Opportunity`.

pub mod cache;
pub mod config;
pub mod decode;
pub mod detector;
pub mod dex;
pub mod error;
pub mod math;
pub mod speculative;
pub mod store;

pub use cache::HotPathCache;
pub use config::EngineConfig;
pub use detector::Detector;
pub use error::{ConfigError, DecodeError, MathError, SimulationError};
pub use speculative::{PendingTxQueue, SpeculativeDeltaMap};
pub use store::AccountStore;
