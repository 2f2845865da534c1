//! export-stl: convert a parametric CAD document body to an STL mesh
//!
//! Opens one document through the CAD kernel, selects one named object and
//! exports its geometry as a surface mesh.

mod kernel;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;

use kernel::{CadKernel, FreeCadKernel};

const VALID_DOCUMENT_EXTENSIONS: &[&str] = &["fcstd"];

#[derive(Parser, Debug)]
#[command(name = "export-stl", about = "Convert a CAD document body to an STL mesh.")]
struct Cli {
    /// File to convert to stl
    #[arg(short = 'i', long = "input_file", value_name = "FILE")]
    input_file: PathBuf,

    /// Output filename. Default is the same as the original file with an
    /// .stl extension
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Name of the exported body
    // TODO: accept a list of bodies
    #[arg(short = 'e', long, default_value = "Body")]
    exported_body: String,
}

fn ensure_document_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("the file {} does not exist", path.display());
    }
    let recognized = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VALID_DOCUMENT_EXTENSIONS
                .iter()
                .any(|valid| ext.eq_ignore_ascii_case(valid))
        });
    if !recognized {
        bail!(
            "the file {} is not a recognized CAD document",
            path.display()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    ensure_document_file(&cli.input_file)?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input_file.with_extension("stl"));

    let kernel = FreeCadKernel::new();
    if !kernel.is_available() {
        tracing::warn!(
            kernel = kernel.name(),
            "CAD kernel executable not found, the export will likely fail"
        );
    }

    kernel
        .export_mesh(&cli.input_file, &cli.exported_body, &output)
        .with_context(|| {
            format!(
                "failed to export body `{}` from {}",
                cli.exported_body,
                cli.input_file.display()
            )
        })?;
    tracing::info!(output = %output.display(), "exported mesh");

    Ok(())
}

fn main() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mesh_export=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ensure_document_file() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.FCStd");
        assert!(ensure_document_file(&missing).is_err());

        let wrong_ext = dir.path().join("model.step");
        std::fs::write(&wrong_ext, b"").unwrap();
        assert!(ensure_document_file(&wrong_ext).is_err());

        let document = dir.path().join("model.FCStd");
        std::fs::write(&document, b"").unwrap();
        assert!(ensure_document_file(&document).is_ok());
    }

    #[test]
    fn test_default_output_path() {
        let cli = Cli::parse_from(["export-stl", "-i", "parts/base.FCStd"]);
        assert!(cli.output.is_none());
        assert_eq!(
            cli.input_file.with_extension("stl"),
            Path::new("parts/base.stl")
        );
    }

    #[test]
    fn test_exported_body_defaults_to_body() {
        let cli = Cli::parse_from(["export-stl", "-i", "parts/base.FCStd"]);
        assert_eq!(cli.exported_body, "Body");
    }
}
