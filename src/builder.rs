//! Builder for configuring and constructing a `PatchPlayer`.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::{AudioHost, PatchEngine, PlayerConfig};
use crate::{PatchPlayer, Result};

/// The engine and host are supplied at `build` time, so one builder type
/// serves the libpd/CPAL pair as well as test doubles.
///
/// # Example
///
/// ```ignore
/// use patchplay::prelude::*;
///
/// let player = PatchPlayerBuilder::new()
///     .sample_rate(44_100)
///     .buffer_frames(256)
///     .patch("drone.pd", "patches")
///     .build(LibPdEngine::new(), CpalHost::new())?;
///
/// assert_eq!(player.config().render.sample_rate, 44_100);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatchPlayerBuilder {
    config: PlayerConfig,
}

impl PatchPlayerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 48000
    pub fn sample_rate(mut self, hz: u32) -> Self {
        self.config.render.sample_rate = hz;
        self
    }

    /// Default: 2
    pub fn outputs(mut self, count: usize) -> Self {
        self.config.render.output_channels = count;
        self
    }

    /// Preferred device buffer size in frames. Default: 512
    pub fn buffer_frames(mut self, frames: u32) -> Self {
        self.config.render.buffer_frames = frames;
        self
    }

    /// Default: `pd`
    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.search_path = path.into();
        self
    }

    /// Default: `test.pd` in the working directory.
    pub fn patch(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.config.patch_name = name.into();
        self.config.patch_dir = dir.into();
        self
    }

    /// How long a session plays before shutting down. Default: 10 s
    pub fn run_duration(mut self, duration: Duration) -> Self {
        self.config.run_duration = duration;
        self
    }

    pub fn window_title(mut self, title: impl Into<String>) -> Self {
        self.config.window.title = title.into();
        self
    }

    /// Validate the configuration and assemble the player.
    ///
    /// Nothing is initialised here; the engine and device come up in
    /// [`PatchPlayer::setup`].
    pub fn build<E, H>(self, engine: E, host: H) -> Result<PatchPlayer<E, H>>
    where
        E: PatchEngine,
        H: AudioHost,
    {
        self.config.validate()?;
        Ok(PatchPlayer::from_parts(self.config, engine, host))
    }
}
