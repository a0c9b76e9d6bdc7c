//! Live preview: writes the generated program to a scratch cargo project and
//! runs it in the background.
//!
//! Launching never waits for the build. Compiler and runtime output go to
//! the child's inherited stdout/stderr; nothing is reported back into the
//! design.

use crate::codegen::GeneratedProgram;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use tracing::{info, warn};

/// Scratch project location used unless the builder is told otherwise.
pub(crate) fn default_dir() -> PathBuf {
    std::env::temp_dir().join("gui-designer-preview")
}

/// Writes `Cargo.toml` and `src/main.rs` for `program` under `dir`.
pub(crate) fn write_project(dir: &Path, program: &GeneratedProgram) -> io::Result<()> {
    fs::create_dir_all(dir.join("src"))?;
    fs::write(dir.join("Cargo.toml"), &program.manifest)?;
    fs::write(dir.join("src").join("main.rs"), &program.main_rs)?;
    Ok(())
}

/// Handle to a running preview process.
#[derive(Debug)]
pub(crate) struct PreviewTask {
    child: Child,
}

impl PreviewTask {
    /// Writes the project and starts `cargo run` in it.
    pub(crate) fn launch(dir: &Path, program: &GeneratedProgram) -> io::Result<Self> {
        write_project(dir, program)?;
        let mut cmd = Command::new("cargo");
        cmd.arg("run").arg("--quiet").current_dir(dir);
        let task = Self::spawn(cmd)?;
        info!(pid = task.id(), dir = %dir.display(), "preview launched");
        Ok(task)
    }

    pub(crate) fn spawn(mut cmd: Command) -> io::Result<Self> {
        Ok(Self {
            child: cmd.spawn()?,
        })
    }

    pub(crate) fn id(&self) -> u32 {
        self.child.id()
    }

    /// Polls without blocking.
    pub(crate) fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(e) => {
                warn!(error = %e, "failed to poll preview process");
                false
            }
        }
    }

    pub(crate) fn cancel(&mut self) -> io::Result<()> {
        if self.is_running() {
            self.child.kill()?;
            self.child.wait()?;
        }
        Ok(())
    }
}
