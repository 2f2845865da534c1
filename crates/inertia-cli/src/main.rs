//! get-inertia: derive rigid-body inertial parameters from a surface mesh
//!
//! Runs the external mesh analyzer, parses its report, rescales the result
//! to the requested units and mass, and writes a URDF or SDF inertial
//! fragment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use inertia_core::{
    MassSpec, MeshAnalyzer, MeshLabServer, MeshProperties, OutputFormat, UnitSystem,
    parse_report, write_fragment,
};

const VALID_MESH_EXTENSIONS: &[&str] = &["stl"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UnitsArg {
    Mm,
    M,
}

impl From<UnitsArg> for UnitSystem {
    fn from(arg: UnitsArg) -> Self {
        match arg {
            UnitsArg::Mm => UnitSystem::Millimeters,
            UnitsArg::M => UnitSystem::Meters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Urdf,
    Sdf,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Urdf => OutputFormat::Urdf,
            FormatArg::Sdf => OutputFormat::Sdf,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "get-inertia",
    about = "Generate a URDF or SDF fragment containing inertial parameters \
             calculated for a given mesh file."
)]
struct Cli {
    /// Input mesh file
    #[arg(short = 'i', long = "input-file", value_name = "FILE")]
    input_file: PathBuf,

    /// Output file. Defaults to the input filename with the chosen format's
    /// extension
    #[arg(short = 'o', long = "output-file", value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Units in which the input file is specified
    #[arg(short = 'u', long, value_enum, default_value = "mm")]
    units: UnitsArg,

    /// Assume this material density for inertia and mass calculations [kg/m3]
    #[arg(short = 'd', long)]
    density: Option<f64>,

    /// Assume this mass for inertia calculations [kg]
    #[arg(short = 'm', long)]
    mass: Option<f64>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "urdf")]
    format: FormatArg,

    /// Export the mesh bounding box as a collision element (only for URDF)
    #[arg(short = 'c', long = "collision-file", value_name = "FILE")]
    collision_file: Option<PathBuf>,
}

fn ensure_mesh_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("the file {} does not exist", path.display());
    }
    let recognized = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VALID_MESH_EXTENSIONS
                .iter()
                .any(|valid| ext.eq_ignore_ascii_case(valid))
        });
    if !recognized {
        bail!(
            "the file {} does not have a recognized mesh extension",
            path.display()
        );
    }
    Ok(())
}

fn derive_output_path(input: &Path, extension: &str) -> PathBuf {
    input.with_extension(extension)
}

fn run(cli: Cli) -> Result<()> {
    ensure_mesh_file(&cli.input_file)?;

    // Both mutually-exclusive combinations are rejected here, before any
    // external invocation.
    let mass_spec = MassSpec::from_options(cli.mass, cli.density)?;
    let format = OutputFormat::from(cli.format);
    let with_collision = cli.collision_file.is_some();
    if with_collision && format == OutputFormat::Sdf {
        bail!("collision export is not supported for the SDF format");
    }

    let units = UnitSystem::from(cli.units);
    let output_file = cli
        .output_file
        .clone()
        .unwrap_or_else(|| derive_output_path(&cli.input_file, format.extension()));

    let analyzer = MeshLabServer::new();
    tracing::info!(
        analyzer = analyzer.name(),
        mesh = %cli.input_file.display(),
        "running mesh analysis"
    );
    let report = analyzer
        .analyze(&cli.input_file, units)
        .context("mesh analysis failed")?;

    let raw = parse_report(&report).context("could not parse the analyzer report")?;
    let props = MeshProperties::from_report(&raw, units, &mass_spec, with_collision)?;

    write_fragment(format, &props, &output_file)
        .with_context(|| format!("failed to write {}", output_file.display()))?;
    tracing::info!(output = %output_file.display(), "wrote inertial fragment");

    Ok(())
}

fn main() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inertia_cli=info,inertia_core=info".into()),
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
    fn test_derive_output_path() {
        assert_eq!(
            derive_output_path(Path::new("parts/base.stl"), "urdf"),
            Path::new("parts/base.urdf")
        );
        assert_eq!(
            derive_output_path(Path::new("base.stl"), "sdf"),
            Path::new("base.sdf")
        );
    }

    #[test]
    fn test_ensure_mesh_file() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.stl");
        assert!(ensure_mesh_file(&missing).is_err());

        let wrong_ext = dir.path().join("model.obj");
        std::fs::write(&wrong_ext, b"").unwrap();
        assert!(ensure_mesh_file(&wrong_ext).is_err());

        let mesh = dir.path().join("model.stl");
        std::fs::write(&mesh, b"").unwrap();
        assert!(ensure_mesh_file(&mesh).is_ok());

        // Extension matching is case-insensitive.
        let upper = dir.path().join("MODEL.STL");
        std::fs::write(&upper, b"").unwrap();
        assert!(ensure_mesh_file(&upper).is_ok());
    }

    #[test]
    fn test_sdf_with_collision_is_rejected_before_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = dir.path().join("model.stl");
        std::fs::write(&mesh, b"").unwrap();

        let cli = Cli::parse_from([
            "get-inertia",
            "-i",
            mesh.to_str().unwrap(),
            "-f",
            "sdf",
            "-c",
            "collision.stl",
        ]);
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("not supported for the SDF format"));
    }

    #[test]
    fn test_mass_and_density_conflict_is_fatal_before_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = dir.path().join("model.stl");
        std::fs::write(&mesh, b"").unwrap();

        let cli = Cli::parse_from([
            "get-inertia",
            "-i",
            mesh.to_str().unwrap(),
            "-m",
            "2.0",
            "-d",
            "500",
        ]);
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }
}
