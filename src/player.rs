//! PatchPlayer: wires one patch bridge to one output device.

use tracing::{error, info};

use crate::core::{
    init_first_driver, render_callback, AudioAdapter, AudioHost, DeviceId, DeviceSpec,
    PatchBridge, PatchEngine, PlayerConfig, SharedBridge,
};
use crate::{Error, Result};

/// Where a player is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerPhase {
    #[default]
    Created,
    /// Engine, patch and device are up; the device is still paused.
    Ready,
    Playing,
    /// Setup stopped part way. Nothing further runs.
    Failed,
    ShutDown,
}

impl PlayerPhase {
    pub fn name(self) -> &'static str {
        match self {
            PlayerPhase::Created => "created",
            PlayerPhase::Ready => "ready",
            PlayerPhase::Playing => "playing",
            PlayerPhase::Failed => "failed",
            PlayerPhase::ShutDown => "shut down",
        }
    }
}

/// Plays one patch through one output device.
///
/// The device callback holds its own handle to the bridge, so no pointer
/// round-trips through the platform layer. The main thread only locks the
/// bridge during setup and shutdown, never while the device is unpaused.
///
/// # Example
///
/// ```ignore
/// use patchplay::prelude::*;
///
/// let mut player = PatchPlayerBuilder::new()
///     .patch("test.pd", ".")
///     .build(LibPdEngine::new(), CpalHost::new())?;
///
/// player.setup()?;
/// player.start()?;
/// std::thread::sleep(std::time::Duration::from_secs(10));
/// player.shutdown()?;
/// ```
pub struct PatchPlayer<E: PatchEngine, H: AudioHost> {
    config: PlayerConfig,
    bridge: SharedBridge<E>,
    host: H,
    adapter: AudioAdapter<H::Device>,
    phase: PlayerPhase,
    /// Copied out of the bridge during setup so readers never take its lock.
    block_size: usize,
}

impl<E: PatchEngine, H: AudioHost> PatchPlayer<E, H> {
    pub(crate) fn from_parts(config: PlayerConfig, engine: E, host: H) -> Self {
        let bridge = PatchBridge::new(engine, config.render).into_shared();
        Self {
            config,
            bridge,
            host,
            adapter: AudioAdapter::new(),
            phase: PlayerPhase::Created,
            block_size: 0,
        }
    }

    /// Initialise the engine, open the patch, pick a driver and open the
    /// output device (paused).
    ///
    /// Any failure is logged and leaves the player in [`PlayerPhase::Failed`];
    /// `start` and `shutdown` are then refused.
    pub fn setup(&mut self) -> Result<()> {
        if self.phase != PlayerPhase::Created {
            return Err(self.refuse("set up"));
        }

        match self.try_setup() {
            Ok(()) => {
                self.phase = PlayerPhase::Ready;
                Ok(())
            }
            Err(e) => {
                self.phase = PlayerPhase::Failed;
                Err(e)
            }
        }
    }

    fn try_setup(&mut self) -> Result<()> {
        self.config.validate()?;

        {
            let mut bridge = self.bridge.lock();
            bridge
                .setup(
                    &self.config.search_path,
                    &self.config.patch_name,
                    &self.config.patch_dir,
                )
                .inspect_err(|e| error!("{e}"))?;
            self.block_size = bridge.block_size();
        }

        init_first_driver(&mut self.host)?;

        let desired = DeviceSpec::desired(&self.config.render);
        let callback = render_callback(self.bridge.clone());
        self.adapter.open(&mut self.host, &desired, callback)?;

        Ok(())
    }

    /// Arm the engine, then unpause the device.
    pub fn start(&mut self) -> Result<()> {
        if self.phase != PlayerPhase::Ready {
            return Err(self.refuse("start"));
        }

        info!("SoundCheck one two");
        self.bridge.lock().set_compute(true);
        self.adapter.start()?;
        self.phase = PlayerPhase::Playing;
        Ok(())
    }

    /// Pause and close the device, then disarm the engine and close the patch.
    ///
    /// Runs the whole sequence even if a step fails and reports the first
    /// error. Calling it again after a shutdown is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        match self.phase {
            PlayerPhase::ShutDown => return Ok(()),
            PlayerPhase::Ready | PlayerPhase::Playing => {}
            PlayerPhase::Created | PlayerPhase::Failed => return Err(self.refuse("shut down")),
        }

        let device = self.adapter.close();
        // The device is closed; no callback holds the bridge any more.
        let patch = self.bridge.lock().close();
        self.phase = PlayerPhase::ShutDown;
        info!("playback shut down");

        device?;
        patch?;
        Ok(())
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlayerPhase::Playing
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Spec the device actually granted, while it is open.
    pub fn device_spec(&self) -> Option<DeviceSpec> {
        self.adapter.spec().copied()
    }

    pub fn device_id(&self) -> Option<DeviceId> {
        self.adapter.id()
    }

    /// Engine block size. Zero until setup has opened the patch.
    ///
    /// Safe to call while playing: it does not touch the bridge.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn refuse(&self, operation: &'static str) -> Error {
        Error::Lifecycle {
            operation,
            phase: self.phase.name(),
        }
    }
}
