//! Error types for patchplay-core.

use thiserror::Error;

/// Error type for patchplay-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Could not init engine: {0}")]
    EngineInit(String),

    #[error("Failed to open patch '{name}': {reason}")]
    PatchOpen { name: String, reason: String },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Failed to init audio: {0}")]
    DriverInit(String),

    #[error("Failed to open audio device: {0}")]
    DeviceOpen(String),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[cfg(feature = "cpal")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to pause audio stream")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "cpal")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    #[cfg(feature = "cpal")]
    #[error("Audio host unavailable")]
    HostUnavailable(#[from] cpal::HostUnavailable),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
