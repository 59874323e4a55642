//! Capability surface of the external patch engine.

use std::path::Path;

use crate::Result;

/// An embedded signal-processing engine that evaluates one loaded patch.
///
/// The bridge only ever talks to the engine through this trait, so the
/// engine's internals (and whether it is Pure Data at all) stay opaque.
///
/// Implementations are moved onto the audio thread for playback and back
/// to the main thread for shutdown, hence `Send`.
pub trait PatchEngine: Send + 'static {
    /// Handle to a loaded patch. Consumed by [`close_patch`](Self::close_patch).
    ///
    /// `PatchBridge` owns the handle privately and gives it up on its first
    /// close, so it reaches `close_patch` at most once whether or not it is
    /// `Clone`.
    type Patch: Send;

    /// Construct the engine with the given channel layout and rate.
    fn init(&mut self, inputs: usize, outputs: usize, sample_rate: u32) -> Result<()>;

    /// Register a directory searched when the patch references other files.
    fn add_search_path(&mut self, path: &Path);

    /// Open `name` from `dir`. Failures are whatever the engine reports.
    fn open_patch(&mut self, name: &str, dir: &Path) -> Result<Self::Patch>;

    /// Frames produced per processing step. Fixed for the engine's lifetime.
    fn block_size(&self) -> usize;

    /// Arm or disarm signal computation.
    fn set_compute(&mut self, enabled: bool);

    /// Render `ticks` blocks of interleaved samples into `output`.
    ///
    /// `output` must hold at least `ticks * block_size * outputs` samples.
    fn process_float(&mut self, ticks: usize, input: &[f32], output: &mut [f32]);

    fn close_patch(&mut self, patch: Self::Patch) -> Result<()>;
}
