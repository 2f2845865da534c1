//! Pattern matcher for the mesh analyzer's textual report
//!
//! The external analysis tool prints its results as free text. Each known
//! section is a label followed by a fixed number of floating-point values,
//! captured in order by a pre-compiled regular expression.

use std::sync::LazyLock;

use glam::DVec3;
use regex::Regex;
use thiserror::Error;

/// One signed decimal with a mandatory fractional part, followed by at least
/// one separator character. The separator class excludes the minus sign so
/// that adjacent negative values are not glued together.
const FLOAT_FIELD: &str = r"([+-]?\d+\.\d+)[^0-9\-]+";

const VOLUME_LABEL: &str = "Mesh Volume";
const COM_LABEL: &str = "Center of Mass";
const INERTIA_LABEL: &str = "Inertia Tensor";
const BBOX_MIN_LABEL: &str = "Mesh Bounding Box min";
const BBOX_MAX_LABEL: &str = "Mesh Bounding Box max";

static VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| section_pattern(VOLUME_LABEL, 1));
static COM_RE: LazyLock<Regex> = LazyLock::new(|| section_pattern(COM_LABEL, 3));
static INERTIA_RE: LazyLock<Regex> = LazyLock::new(|| section_pattern(INERTIA_LABEL, 9));
static BBOX_MIN_RE: LazyLock<Regex> = LazyLock::new(|| section_pattern(BBOX_MIN_LABEL, 3));
static BBOX_MAX_RE: LazyLock<Regex> = LazyLock::new(|| section_pattern(BBOX_MAX_LABEL, 3));

/// Build the pattern for one report section: the literal label, then
/// `fields` ordered floating-point captures separated by arbitrary
/// non-numeric text.
fn section_pattern(label: &str, fields: usize) -> Regex {
    let pattern = std::iter::once(regex::escape(label))
        .chain(std::iter::repeat(FLOAT_FIELD.to_string()).take(fields))
        .collect::<Vec<_>>()
        .join(r"[^0-9\-]*");
    Regex::new(&pattern).expect("valid report section regex")
}

/// Errors raised while matching the analyzer report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// The section label was absent, or its values were missing, malformed
    /// or out of order.
    #[error("report section `{0}` not found or malformed")]
    MissingSection(&'static str),
    /// A captured field could not be read as a floating-point number.
    #[error("report section `{section}` contains an unreadable value `{value}`")]
    MalformedField {
        section: &'static str,
        value: String,
    },
}

/// The raw, unscaled values of one analysis run, still in the tool's native
/// unit and unit-density convention.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReport {
    pub volume: f64,
    pub center_of_mass: DVec3,
    /// Row-major 3x3 inertia tensor; only the upper triangle is used
    /// downstream since the tensor is symmetric.
    pub inertia: [f64; 9],
    pub bbox_min: DVec3,
    pub bbox_max: DVec3,
}

/// Extract all known sections from the captured report text.
///
/// The report is authoritative and deterministic per run, so any mismatch is
/// fatal for the invocation; nothing is defaulted or retried.
pub fn parse_report(text: &str) -> Result<RawReport, ReportError> {
    let volume = extract_fields(&VOLUME_RE, text, VOLUME_LABEL, 1)?;
    let com = extract_fields(&COM_RE, text, COM_LABEL, 3)?;
    let inertia = extract_fields(&INERTIA_RE, text, INERTIA_LABEL, 9)?;
    let bbox_min = extract_fields(&BBOX_MIN_RE, text, BBOX_MIN_LABEL, 3)?;
    let bbox_max = extract_fields(&BBOX_MAX_RE, text, BBOX_MAX_LABEL, 3)?;

    let mut tensor = [0.0; 9];
    tensor.copy_from_slice(&inertia);

    Ok(RawReport {
        volume: volume[0],
        center_of_mass: DVec3::new(com[0], com[1], com[2]),
        inertia: tensor,
        bbox_min: DVec3::new(bbox_min[0], bbox_min[1], bbox_min[2]),
        bbox_max: DVec3::new(bbox_max[0], bbox_max[1], bbox_max[2]),
    })
}

fn extract_fields(
    re: &Regex,
    text: &str,
    section: &'static str,
    count: usize,
) -> Result<Vec<f64>, ReportError> {
    let captures = re
        .captures(text)
        .ok_or(ReportError::MissingSection(section))?;

    (1..=count)
        .map(|i| {
            let field = captures
                .get(i)
                .ok_or(ReportError::MissingSection(section))?;
            field
                .as_str()
                .parse::<f64>()
                .map_err(|_| ReportError::MalformedField {
                    section,
                    value: field.as_str().to_string(),
                })
        })
        .collect()
}
