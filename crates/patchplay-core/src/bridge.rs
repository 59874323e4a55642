//! Render callback adapter between the output device and the patch engine.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{RenderConfig, SAMPLE_BYTES};
use crate::device::RenderCallback;
use crate::engine::PatchEngine;
use crate::Result;

/// Bridge shared between the main thread and the device callback.
pub type SharedBridge<E> = Arc<Mutex<PatchBridge<E>>>;

/// Number of engine steps that fit in a request of `len_bytes` bytes.
///
/// Truncates: bytes past the last whole step are not rendered. Zero when
/// the step size is zero (engine not set up yet).
#[inline]
pub fn step_count(len_bytes: usize, block_size: usize, output_channels: usize) -> usize {
    let step_bytes = block_size * output_channels * SAMPLE_BYTES;
    if step_bytes == 0 {
        return 0;
    }
    len_bytes / step_bytes
}

/// Owns the engine and the one loaded patch.
pub struct PatchBridge<E: PatchEngine> {
    engine: E,
    patch: Option<E::Patch>,
    config: RenderConfig,
    block_size: usize,
    computing: bool,
    /// Never filled; the engine is configured without inputs.
    input: Vec<f32>,
}

impl<E: PatchEngine> PatchBridge<E> {
    pub fn new(engine: E, config: RenderConfig) -> Self {
        Self {
            engine,
            patch: None,
            input: Vec::new(),
            config,
            block_size: 0,
            computing: false,
        }
    }

    /// Initialise the engine, register the search path, open the patch and
    /// read the engine's block size.
    pub fn setup(&mut self, search_path: &Path, patch_name: &str, patch_dir: &Path) -> Result<()> {
        self.engine.init(
            self.config.input_channels,
            self.config.output_channels,
            self.config.sample_rate,
        )?;
        info!("engine initialised");

        self.engine.add_search_path(search_path);

        let patch = self.engine.open_patch(patch_name, patch_dir)?;
        self.patch = Some(patch);
        self.block_size = self.engine.block_size();
        debug!(
            patch = patch_name,
            block_size = self.block_size,
            "patch opened"
        );

        Ok(())
    }

    pub fn set_compute(&mut self, enabled: bool) {
        self.engine.set_compute(enabled);
        self.computing = enabled;
    }

    /// Fill `output` with as many whole engine steps as fit.
    ///
    /// Returns the number of steps rendered. Samples past the last whole
    /// step keep whatever the buffer held before.
    #[inline]
    pub fn render(&mut self, output: &mut [f32]) -> usize {
        let ticks = step_count(
            core::mem::size_of_val(output),
            self.block_size,
            self.config.output_channels,
        );
        self.engine.process_float(ticks, &self.input, output);
        ticks
    }

    /// Disable computation, then close the patch. Safe to call twice.
    pub fn close(&mut self) -> Result<()> {
        self.set_compute(false);
        match self.patch.take() {
            Some(patch) => self.engine.close_patch(patch),
            None => Ok(()),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_computing(&self) -> bool {
        self.computing
    }

    pub fn has_patch(&self) -> bool {
        self.patch.is_some()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn into_shared(self) -> SharedBridge<E> {
        Arc::new(Mutex::new(self))
    }
}

/// Build the device callback for a shared bridge.
///
/// The closure owns its own handle to the bridge. It never blocks: if the
/// main thread holds the lock, the buffer is filled with silence instead.
pub fn render_callback<E: PatchEngine>(bridge: SharedBridge<E>) -> RenderCallback {
    Box::new(move |data: &mut [f32]| match bridge.try_lock() {
        Some(mut bridge) => {
            bridge.render(data);
        }
        None => data.fill(0.0),
    })
}
