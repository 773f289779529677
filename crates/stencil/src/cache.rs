//! Persistent compilation cache.
//!
//! One JSON artifact per template, named by the blake3 hex of the resolved
//! source path. An artifact is reused while its modification time is at
//! least the source's; otherwise the template is recompiled and the
//! artifact overwritten. Concurrent writers race benignly: recompilation is
//! idempotent, last writer wins. Debug mode disables the cache entirely.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use stencil_compiler::Program;
use tracing::{debug, trace};

use crate::error::RenderError;

pub(crate) struct ProgramCache {
    dir: PathBuf,
    enabled: bool,
}

impl ProgramCache {
    pub fn new(dir: PathBuf, enabled: bool) -> Self {
        Self { dir, enabled }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn artifact_path(&self, source_path: &Path) -> PathBuf {
        let key = blake3::hash(source_path.to_string_lossy().as_bytes());
        self.dir.join(format!("{}.json", key.to_hex()))
    }

    /// Returns the cached program when the artifact is current, `None` on a
    /// miss. An unreadable artifact counts as a miss and is overwritten by
    /// the next store.
    pub fn load(&self, source_path: &Path, source_mtime: SystemTime) -> Option<Program> {
        if !self.enabled {
            return None;
        }

        let artifact = self.artifact_path(source_path);
        let artifact_mtime = fs::metadata(&artifact).and_then(|m| m.modified()).ok()?;
        if artifact_mtime < source_mtime {
            return None;
        }

        let bytes = fs::read(&artifact).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(program) => {
                trace!(artifact = %artifact.display(), "compiled template cache hit");
                Some(program)
            }
            Err(err) => {
                debug!(
                    artifact = %artifact.display(),
                    error = %err,
                    "discarding unreadable cache artifact"
                );
                None
            }
        }
    }

    pub fn store(&self, source_path: &Path, program: &Program) -> Result<(), RenderError> {
        if !self.enabled {
            return Ok(());
        }
        let bytes = serde_json::to_vec(program)?;
        fs::write(self.artifact_path(source_path), bytes)?;
        Ok(())
    }
}
