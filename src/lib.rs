//! # Framefix
//!
//! Two small reactive controllers that run inside a host simulation's
//! per-frame callback and repair or override transient host state.
//!
//! - **Phone UI repair**: a six-stage teardown/rebuild pipeline, started by a
//!   typed phrase or by a periodic timer guarded against cutscenes and pauses.
//! - **Engine override**: a key toggles the current vehicle's engine and the
//!   new state is re-asserted every frame until the player leaves, swaps
//!   vehicles, or restarts the engine natively.
//!
//! Nothing blocks inside a frame. All waiting is state carried to the next
//! call.
//!
//! ## Quick Start
//!
//! ```rust
//! use framefix::{Config, FrameDriver};
//! use framefix::sim::SimHost;
//!
//! let config = Config::default();
//! let mut host = SimHost::new();
//! let mut driver: FrameDriver<SimHost> = FrameDriver::from_config(&config, 0);
//!
//! host.enter_phrase(&config.repair.trigger_phrase);
//! for _ in 0..120 {
//!     driver.tick(&mut host);
//!     host.advance(16);
//! }
//! assert_eq!(host.notices().last(), Some(&"Phone UI refresh complete"));
//! ```
//!
//! ## Architecture
//!
//! - [`host`] - Capability traits the host implements
//! - [`repair`] - Phone UI repair pipeline
//! - [`engine`] - Engine override and toggle animation
//! - [`driver`] - Per-frame fan-out to registered controllers
//! - [`config`] - Startup configuration
//! - [`sim`] - In-memory host for tests and the simulator

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::new_without_default)]

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod host;
pub mod keys;
pub mod repair;
pub mod sim;

// Re-export main public types for convenience
pub use config::{Config, EngineConfig, PeriodicGuard, RepairConfig};
pub use driver::{FrameController, FrameDriver};
pub use engine::{EngineOverride, OverrideState};
pub use error::ConfigError;
pub use host::Host;
pub use keys::Key;
pub use repair::{PipelineState, RepairPipeline, RepairStage};
