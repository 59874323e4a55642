//! Centralized error type for the patchplay umbrella crate.
//!
//! Wraps the core errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] patchplay_core::Error),

    #[error("Cannot {operation} a player that is {phase}")]
    Lifecycle {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("Window: {0}")]
    Window(String),
}

pub type Result<T> = std::result::Result<T, Error>;
