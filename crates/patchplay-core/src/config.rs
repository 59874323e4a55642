//! Render and player configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Bytes per output sample. Output is always 32-bit float.
pub const SAMPLE_BYTES: usize = core::mem::size_of::<f32>();

/// Fixed render parameters shared by the engine and the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub input_channels: usize,
    pub output_channels: usize,
    /// Preferred device buffer size in frames.
    pub buffer_frames: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            input_channels: 0,
            output_channels: 2,
            buffer_frames: 512,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000..=384000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.output_channels == 0 {
            return Err(Error::InvalidConfig(
                "output_channels must be at least 1".into(),
            ));
        }
        if self.buffer_frames == 0 {
            return Err(Error::InvalidConfig(
                "buffer_frames must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Bytes the device asks for per callback when it grants the preferred buffer size.
    pub fn buffer_bytes(&self) -> usize {
        self.buffer_frames as usize * self.output_channels * SAMPLE_BYTES
    }
}

/// Window shown while the patch plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Fill colour as sRGB `[r, g, b]`.
    pub background: [u8; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "SDL width LibPD".into(),
            width: 800,
            height: 600,
            background: [0x22, 0x00, 0x00],
        }
    }
}

/// Everything a single playback run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub render: RenderConfig,
    /// Directory the engine searches when resolving abstractions.
    pub search_path: PathBuf,
    pub patch_name: String,
    pub patch_dir: PathBuf,
    pub run_duration: Duration,
    pub window: WindowConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            search_path: PathBuf::from("pd"),
            patch_name: "test.pd".into(),
            patch_dir: PathBuf::from("."),
            run_duration: Duration::from_secs(10),
            window: WindowConfig::default(),
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        if self.patch_name.is_empty() {
            return Err(Error::InvalidConfig("patch_name must not be empty".into()));
        }
        Ok(())
    }
}
