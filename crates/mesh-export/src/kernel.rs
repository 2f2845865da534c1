//! CAD kernel abstraction
//!
//! The kernel owns document load and mesh export; this side only asks it to
//! export one named object of one document. The trait keeps the CLI testable
//! without a kernel installation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Errors raised while driving the CAD kernel
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("failed to launch CAD kernel `{0}`: {1}")]
    Launch(String, String),
    #[error("CAD kernel export failed: {0}")]
    Kernel(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// A CAD kernel that can export a named body of a document as a mesh
pub trait CadKernel {
    /// Name of this kernel
    fn name(&self) -> &str;

    /// Check whether the kernel is installed and runnable
    fn is_available(&self) -> bool;

    /// Export `body` from `document` as a mesh file at `output`.
    ///
    /// The kernel raises if the document cannot be opened or the named
    /// object does not exist; both are propagated as `ExportError::Kernel`.
    fn export_mesh(&self, document: &Path, body: &str, output: &Path) -> Result<(), ExportError>;
}

/// Drives FreeCAD's console runner with a generated export macro
#[derive(Debug, Clone)]
pub struct FreeCadKernel {
    executable: PathBuf,
}

impl FreeCadKernel {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("freecadcmd"),
        }
    }

    /// Override the kernel executable
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// The macro run inside the kernel: open one document, look up one
    /// object by name, export it.
    fn export_macro(document: &Path, body: &str, output: &Path) -> String {
        format!(
            r#"import FreeCAD
import Mesh

doc = FreeCAD.open(r"{document}")
obj = doc.getObject("{body}")
if obj is None:
    raise RuntimeError('no object named "{body}" in document ' + doc.Name)
Mesh.export([obj], r"{output}")
"#,
            document = document.display(),
            body = body,
            output = output.display(),
        )
    }
}

impl Default for FreeCadKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl CadKernel for FreeCadKernel {
    fn name(&self) -> &str {
        "freecad"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.executable)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn export_mesh(&self, document: &Path, body: &str, output: &Path) -> Result<(), ExportError> {
        let mut script = tempfile::Builder::new()
            .prefix("export-stl-")
            .suffix(".py")
            .tempfile()
            .map_err(|e| ExportError::Io(e.to_string()))?;
        script
            .write_all(Self::export_macro(document, body, output).as_bytes())
            .map_err(|e| ExportError::Io(e.to_string()))?;
        script.flush().map_err(|e| ExportError::Io(e.to_string()))?;

        tracing::debug!(
            executable = %self.executable.display(),
            document = %document.display(),
            body,
            "invoking CAD kernel"
        );

        let result = Command::new(&self.executable)
            .arg(script.path())
            .output()
            .map_err(|e| {
                ExportError::Launch(self.executable.display().to_string(), e.to_string())
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let reason = stderr
                .trim()
                .lines()
                .next_back()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ExportError::Kernel(reason));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_macro_contents() {
        let script = FreeCadKernel::export_macro(
            Path::new("robots/arm.FCStd"),
            "UpperArm",
            Path::new("robots/arm.stl"),
        );
        assert!(script.contains(r#"FreeCAD.open(r"robots/arm.FCStd")"#));
        assert!(script.contains(r#"doc.getObject("UpperArm")"#));
        assert!(script.contains(r#"Mesh.export([obj], r"robots/arm.stl")"#));
    }

    #[test]
    fn test_launch_failure_names_executable() {
        let kernel = FreeCadKernel::new().with_executable("definitely-not-a-real-kernel");
        assert!(!kernel.is_available());

        let err = kernel
            .export_mesh(Path::new("a.FCStd"), "Body", Path::new("a.stl"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Launch(executable, _)
            if executable == "definitely-not-a-real-kernel"));
    }
}
