//! Glue between an embedded patch engine and a platform audio output device.
//!
//! # Primary API
//!
//! - [`PatchEngine`]: capability surface of the external engine
//! - [`PatchBridge`]: owns the engine and one patch, renders on demand
//! - [`AudioHost`] / [`AudioDevice`]: capability surface of the platform audio layer
//! - [`AudioAdapter`]: owns the opened device and its lifecycle
//!
//! # Feature-gated APIs
//!
//! - `"cpal"`: [`CpalHost`] platform output
//! - `"libpd"`: [`LibPdEngine`] Pure Data engine
//!
//! # Example
//!
//! ```ignore
//! use patchplay_core::*;
//!
//! let render = RenderConfig::default();
//! let mut bridge = PatchBridge::new(LibPdEngine::new(), render);
//! bridge.setup("pd".as_ref(), "test.pd", ".".as_ref())?;
//! let bridge = bridge.into_shared();
//!
//! let mut host = CpalHost::new();
//! init_first_driver(&mut host)?;
//! let mut adapter = AudioAdapter::new();
//! adapter.open(&mut host, &DeviceSpec::desired(&render), render_callback(bridge.clone()))?;
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{PlayerConfig, RenderConfig, WindowConfig, SAMPLE_BYTES};

mod engine;
pub use engine::PatchEngine;

mod bridge;
pub use bridge::{render_callback, step_count, PatchBridge, SharedBridge};

mod device;
pub use device::{
    differs_in_layout, init_first_driver, AdapterState, AudioAdapter, AudioDevice, AudioHost,
    DeviceId, DeviceSpec, RenderCallback, SampleFormat,
};

#[cfg(feature = "cpal")]
mod output;
#[cfg(feature = "cpal")]
pub use output::{CpalDevice, CpalHost};

#[cfg(feature = "libpd")]
mod pd;
#[cfg(feature = "libpd")]
pub use pd::{LibPdEngine, PdPatch};
