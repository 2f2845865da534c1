//! Inertial-fragment serializers
//!
//! Renders a MeshProperties instance as a robot-description XML fragment in
//! one of two dialects. The dialects disagree on element naming, nesting and
//! numeric formatting, so each is a separate writer behind a common trait.

use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::properties::MeshProperties;

/// Output fragment dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Urdf,
    Sdf,
}

impl OutputFormat {
    /// File extension for this dialect
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Urdf => "urdf",
            OutputFormat::Sdf => "sdf",
        }
    }
}

/// Errors raised while rendering or writing a fragment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    #[error("XML error: {0}")]
    Xml(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("collision export is not supported for the SDF dialect")]
    CollisionUnsupported,
}

fn xml_err<E: std::fmt::Display>(e: E) -> FragmentError {
    FragmentError::Xml(e.to_string())
}

/// A dialect-specific fragment renderer
pub trait FragmentWriter {
    /// File extension of the rendered dialect
    fn extension(&self) -> &'static str;

    /// Whether this dialect can carry a collision block
    fn supports_collision(&self) -> bool;

    /// Render the properties as an XML fragment.
    fn render(&self, props: &MeshProperties) -> Result<String, FragmentError>;
}

/// Select the writer for the requested dialect.
pub fn writer_for(format: OutputFormat) -> Box<dyn FragmentWriter> {
    match format {
        OutputFormat::Urdf => Box::new(UrdfWriter),
        OutputFormat::Sdf => Box::new(SdfWriter),
    }
}

/// Render the fragment and overwrite the target file.
pub fn write_fragment(
    format: OutputFormat,
    props: &MeshProperties,
    path: &Path,
) -> Result<(), FragmentError> {
    let mut rendered = writer_for(format).render(props)?;
    rendered.push('\n');
    std::fs::write(path, rendered).map_err(|e| FragmentError::Io(e.to_string()))
}

/// URDF dialect: attribute-valued elements under a `root` wrapper
pub struct UrdfWriter;

impl FragmentWriter for UrdfWriter {
    fn extension(&self) -> &'static str {
        "urdf"
    }

    fn supports_collision(&self) -> bool {
        true
    }

    fn render(&self, props: &MeshProperties) -> Result<String, FragmentError> {
        let mut buf = Vec::new();
        let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);

        writer
            .write_event(Event::Start(BytesStart::new("root")))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Start(BytesStart::new("inertial")))
            .map_err(xml_err)?;

        let com = props.center_of_mass;
        let mut origin = BytesStart::new("origin");
        origin.push_attribute(("rpy", "0 0 0"));
        origin.push_attribute(("xyz", format!("{} {} {}", com.x, com.y, com.z).as_str()));
        writer.write_event(Event::Empty(origin)).map_err(xml_err)?;

        let mut mass = BytesStart::new("mass");
        mass.push_attribute(("value", props.mass.to_string().as_str()));
        writer.write_event(Event::Empty(mass)).map_err(xml_err)?;

        let mut inertia = BytesStart::new("inertia");
        for (name, value) in props.inertia.components() {
            inertia.push_attribute((name, value.to_string().as_str()));
        }
        writer.write_event(Event::Empty(inertia)).map_err(xml_err)?;

        writer
            .write_event(Event::End(BytesEnd::new("inertial")))
            .map_err(xml_err)?;

        if let Some(bbox) = &props.bounding_box {
            writer
                .write_event(Event::Start(BytesStart::new("collision")))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Start(BytesStart::new("geometry")))
                .map_err(xml_err)?;

            let size = bbox.size();
            let mut box_el = BytesStart::new("box");
            box_el.push_attribute(("size", format!("{} {} {}", size.x, size.y, size.z).as_str()));
            writer.write_event(Event::Empty(box_el)).map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new("geometry")))
                .map_err(xml_err)?;

            let offset = bbox.offset();
            let mut origin = BytesStart::new("origin");
            origin.push_attribute((
                "xyz",
                format!("{} {} {}", offset.x, offset.y, offset.z).as_str(),
            ));
            writer.write_event(Event::Empty(origin)).map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new("collision")))
                .map_err(xml_err)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("root")))
            .map_err(xml_err)?;

        String::from_utf8(buf).map_err(xml_err)
    }
}

/// SDF dialect: text-valued elements, scientific notation, volume comment
pub struct SdfWriter;

impl FragmentWriter for SdfWriter {
    fn extension(&self) -> &'static str {
        "sdf"
    }

    fn supports_collision(&self) -> bool {
        false
    }

    fn render(&self, props: &MeshProperties) -> Result<String, FragmentError> {
        if props.bounding_box.is_some() {
            return Err(FragmentError::CollisionUnsupported);
        }

        let mut buf = Vec::new();
        let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);

        writer
            .write_event(Event::Start(BytesStart::new("inertial")))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Comment(BytesText::new(&format!(
                "  Volume: {}  ",
                props.volume
            ))))
            .map_err(xml_err)?;

        write_text_element(&mut writer, "mass", &format!(" {} ", sdf_scalar(props.mass)))?;

        let com = props.center_of_mass;
        write_text_element(
            &mut writer,
            "pose",
            &format!(
                " {} {} {} ",
                sdf_scalar(com.x),
                sdf_scalar(com.y),
                sdf_scalar(com.z)
            ),
        )?;

        writer
            .write_event(Event::Start(BytesStart::new("inertia")))
            .map_err(xml_err)?;
        for (name, value) in props.inertia.components() {
            write_text_element(&mut writer, name, &format!(" {} ", sdf_scalar(value)))?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("inertia")))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("inertial")))
            .map_err(xml_err)?;

        String::from_utf8(buf).map_err(xml_err)
    }
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), FragmentError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)?;
    Ok(())
}

/// Format a scalar the way the SDF dialect expects: a space in place of the
/// plus sign, six fractional digits and a signed two-digit exponent, e.g.
/// `" 1.000000e+00"` or `"-6.250000e-06"`.
pub fn sdf_scalar(value: f64) -> String {
    let formatted = format!("{:.6e}", value);
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if mantissa.starts_with('-') { "" } else { " " };
    let exp_sign = if exponent < 0 { '-' } else { '+' };
    format!("{sign}{mantissa}e{exp_sign}{:02}", exponent.abs())
}
