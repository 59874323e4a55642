//! Pure Data engine backed by libpd (requires the `libpd` feature).

use std::path::{Path, PathBuf};

use libpd_rs::convenience::PdGlobal;
use tracing::debug;

use crate::engine::PatchEngine;
use crate::{Error, Result};

/// Wrapper to hold libpd's global handle in a `Send` context.
///
/// libpd keeps one process-wide instance. The handle is only touched through
/// `PatchBridge`, which sits behind a mutex, so calls never overlap.
struct PdHandle(PdGlobal);

// SAFETY: every access goes through `&mut LibPdEngine`, serialized by the
// bridge mutex; libpd itself is not re-entered from two threads at once.
unsafe impl Send for PdHandle {}

/// A patch opened by [`LibPdEngine`].
#[derive(Debug)]
pub struct PdPatch {
    path: PathBuf,
}

impl PdPatch {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The libpd instance. One per process.
#[derive(Default)]
pub struct LibPdEngine {
    pd: Option<PdHandle>,
}

impl LibPdEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn pd(&mut self) -> Result<&mut PdGlobal> {
        self.pd
            .as_mut()
            .map(|handle| &mut handle.0)
            .ok_or_else(|| Error::Engine("libpd is not initialised".into()))
    }
}

impl PatchEngine for LibPdEngine {
    type Patch = PdPatch;

    fn init(&mut self, inputs: usize, outputs: usize, sample_rate: u32) -> Result<()> {
        let pd = PdGlobal::init_and_configure(inputs as i32, outputs as i32, sample_rate as i32)
            .map_err(|e| Error::EngineInit(e.to_string()))?;
        self.pd = Some(PdHandle(pd));
        Ok(())
    }

    fn add_search_path(&mut self, path: &Path) {
        match self.pd() {
            Ok(pd) => {
                if let Err(e) = pd.add_path(path) {
                    debug!(path = %path.display(), "search path not added: {e}");
                }
            }
            Err(e) => debug!("{e}"),
        }
    }

    fn open_patch(&mut self, name: &str, dir: &Path) -> Result<PdPatch> {
        let path = dir.join(name);
        self.pd()?
            .open_patch(&path)
            .map_err(|e| Error::PatchOpen {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(PdPatch { path })
    }

    fn block_size(&self) -> usize {
        libpd_rs::block_size() as usize
    }

    fn set_compute(&mut self, enabled: bool) {
        match self.pd() {
            Ok(pd) => {
                if let Err(e) = pd.activate_audio(enabled) {
                    debug!(enabled, "dsp switch failed: {e}");
                }
            }
            Err(e) => debug!("{e}"),
        }
    }

    #[inline]
    fn process_float(&mut self, ticks: usize, input: &[f32], output: &mut [f32]) {
        libpd_rs::process::process_float(ticks as i32, input, output);
    }

    fn close_patch(&mut self, patch: PdPatch) -> Result<()> {
        self.pd()?
            .close_patch()
            .map_err(|e| Error::Engine(format!("closing {}: {e}", patch.path.display())))
    }
}
