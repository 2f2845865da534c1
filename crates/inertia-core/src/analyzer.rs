//! External mesh-analysis tool abstraction
//!
//! The analyzer runs as a separate process and reports its results as free
//! text on standard output. The trait keeps the report parser testable
//! against fixture text without a tool installation.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::properties::UnitSystem;

/// Default analyzer executable name, resolved via PATH
pub const DEFAULT_ANALYZER_EXECUTABLE: &str = "meshlab.meshlabserver";

/// Errors raised while invoking the analyzer
#[derive(Debug, Clone, Error)]
pub enum AnalyzerError {
    #[error("failed to launch mesh analyzer `{0}`: {1}")]
    Launch(String, String),
}

/// A tool that computes geometric properties of a mesh and returns its
/// textual report.
pub trait MeshAnalyzer {
    /// Name of this analyzer
    fn name(&self) -> &str;

    /// Analyze the mesh and return the captured report text.
    ///
    /// Blocks until the tool completes; no timeout is enforced.
    fn analyze(&self, mesh: &Path, units: UnitSystem) -> Result<String, AnalyzerError>;
}

/// Invokes meshlabserver with the unit-specific analysis macro
#[derive(Debug, Clone)]
pub struct MeshLabServer {
    executable: PathBuf,
    script_dir: PathBuf,
}

impl MeshLabServer {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_ANALYZER_EXECUTABLE),
            script_dir: default_script_dir(),
        }
    }

    /// Override the analyzer executable
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Override the directory holding the analysis macros
    pub fn with_script_dir(mut self, script_dir: impl Into<PathBuf>) -> Self {
        self.script_dir = script_dir.into();
        self
    }
}

impl Default for MeshLabServer {
    fn default() -> Self {
        Self::new()
    }
}

/// The analysis macros ship next to the binary.
fn default_script_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl MeshAnalyzer for MeshLabServer {
    fn name(&self) -> &str {
        "meshlabserver"
    }

    fn analyze(&self, mesh: &Path, units: UnitSystem) -> Result<String, AnalyzerError> {
        let script = self.script_dir.join(units.macro_script());

        tracing::debug!(
            executable = %self.executable.display(),
            mesh = %mesh.display(),
            script = %script.display(),
            "invoking mesh analyzer"
        );

        let output = Command::new(&self.executable)
            .arg("-i")
            .arg(mesh)
            .arg("-s")
            .arg(&script)
            .output()
            .map_err(|e| {
                AnalyzerError::Launch(self.executable.display().to_string(), e.to_string())
            })?;

        if !output.status.success() {
            // The report grammar is the authoritative failure detector, so
            // the captured output is still handed to the parser.
            tracing::warn!(
                status = %output.status,
                "mesh analyzer exited abnormally, attempting to parse its report anyway"
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
