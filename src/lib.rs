//! # patchplay - play a Pure Data patch through the system audio output
//!
//! ## Architecture
//!
//! patchplay is an umbrella crate over:
//! - **patchplay-core** - engine and device seams, the render bridge, the
//!   device adapter, and the libpd / CPAL backends
//! - **player** - one patch wired to one output device, with an ordered
//!   setup / start / shutdown lifecycle
//! - **session** - a timed, cancellable run of a player
//!
//! ## Quick Start
//!
//! ```ignore
//! use patchplay::prelude::*;
//!
//! let player = PatchPlayerBuilder::new()
//!     .patch("test.pd", ".")
//!     .build(LibPdEngine::new(), CpalHost::new())?;
//!
//! let (_stop, signal) = stop_channel();
//! let outcome = Session::new(player).run(&signal);
//! assert!(outcome.is_success());
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - seams, bridge, adapter, player and session (no platform code)
//! - `cpal` - [`CpalHost`] platform output
//! - `libpd` - [`LibPdEngine`] Pure Data engine
//! - `app` - the `patchplay` binary (window + both backends)

/// Re-export of patchplay-core for direct access
pub use patchplay_core as core;

pub use patchplay_core::{
    init_first_driver, render_callback, step_count, AdapterState, AudioAdapter, AudioDevice,
    AudioHost, DeviceId, DeviceSpec, PatchBridge, PatchEngine, PlayerConfig, RenderCallback,
    RenderConfig, SampleFormat, SharedBridge, WindowConfig,
};

#[cfg(feature = "cpal")]
pub use patchplay_core::{CpalDevice, CpalHost};

#[cfg(feature = "libpd")]
pub use patchplay_core::{LibPdEngine, PdPatch};

mod error;
pub use error::{Error, Result};

mod builder;
mod player;
mod session;

pub use builder::PatchPlayerBuilder;
pub use player::{PatchPlayer, PlayerPhase};
pub use session::{stop_channel, Session, SessionOutcome, StopHandle, StopSignal};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{PatchPlayer, PatchPlayerBuilder, PlayerPhase};

    pub use crate::{stop_channel, Session, SessionOutcome, StopHandle};

    pub use crate::core::{AudioHost, PatchEngine, PlayerConfig, RenderConfig};

    #[cfg(feature = "cpal")]
    pub use crate::CpalHost;

    #[cfg(feature = "libpd")]
    pub use crate::LibPdEngine;
}
