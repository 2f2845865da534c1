//! Physically-scaled mesh properties
//!
//! Converts the analyzer's raw, unit-density output into values in the
//! requested unit system and mass. The analyzer computes inertia as if the
//! mesh had density 1 in its own unit, so the tensor is first stripped of
//! that assumption (divide by the scaled volume) and then multiplied by the
//! resolved mass.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::RawReport;

/// Unit system of the input mesh
///
/// Selects both the analysis macro and the scale factor applied to every
/// length-like quantity in the report. The factor pair mirrors the
/// assumptions baked into the two macro variants; it is not a general metric
/// conversion and must be preserved as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Millimeters,
    Meters,
}

impl UnitSystem {
    /// Length scale factor; applied as `factor^1` to coordinates,
    /// `factor^3` to volume and `factor^5` to inertia components.
    pub fn scale_factor(&self) -> f64 {
        match self {
            UnitSystem::Millimeters => 1e-3,
            UnitSystem::Meters => 1e-2,
        }
    }

    /// Analysis macro to run for this unit system
    pub fn macro_script(&self) -> &'static str {
        match self {
            UnitSystem::Millimeters => "cgm.mlx",
            UnitSystem::Meters => "cgm_scale100.mlx",
        }
    }
}

/// How the body's mass is determined
///
/// Exactly one source applies; combining mass and density is rejected when
/// the spec is built, before any external tool is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MassSpec {
    /// Neither mass nor density given; the mass defaults to 1 kg.
    Unit,
    /// Mass in kg, used as-is.
    Mass(f64),
    /// Material density in kg/m3; mass becomes density * volume.
    Density(f64),
}

impl MassSpec {
    /// Build a mass spec from the two optional CLI values.
    pub fn from_options(mass: Option<f64>, density: Option<f64>) -> Result<Self, RescaleError> {
        match (mass, density) {
            (Some(_), Some(_)) => Err(RescaleError::ConflictingMassSpec),
            (Some(m), None) => Ok(MassSpec::Mass(m)),
            (None, Some(d)) => Ok(MassSpec::Density(d)),
            (None, None) => Ok(MassSpec::Unit),
        }
    }

    /// Resolve the final mass for a body of the given (scaled) volume.
    pub fn resolve(&self, volume: f64) -> f64 {
        match self {
            MassSpec::Unit => 1.0,
            MassSpec::Mass(m) => *m,
            MassSpec::Density(d) => d * volume,
        }
    }
}

/// Errors raised while rescaling the raw report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RescaleError {
    #[error("mass and density are mutually exclusive, specify only one")]
    ConflictingMassSpec,
    #[error("mesh volume {0} is zero or not finite, cannot rescale the inertia tensor")]
    DegenerateVolume(f64),
}

/// Upper triangle of the symmetric 3x3 inertia tensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertiaTensor {
    pub ixx: f64,
    pub ixy: f64,
    pub ixz: f64,
    pub iyy: f64,
    pub iyz: f64,
    pub izz: f64,
}

impl InertiaTensor {
    /// Scale the upper triangle of a row-major 3x3 tensor.
    pub fn from_raw(raw: &[f64; 9], factor: f64) -> Self {
        Self {
            ixx: raw[0] * factor,
            ixy: raw[1] * factor,
            ixz: raw[2] * factor,
            iyy: raw[4] * factor,
            iyz: raw[5] * factor,
            izz: raw[8] * factor,
        }
    }

    /// Components in URDF attribute order.
    pub fn components(&self) -> [(&'static str, f64); 6] {
        [
            ("ixx", self.ixx),
            ("ixy", self.ixy),
            ("ixz", self.ixz),
            ("iyy", self.iyy),
            ("iyz", self.iyz),
            ("izz", self.izz),
        ]
    }
}

/// Axis-aligned bounding box in output units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    /// Extent of the box along each axis
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Midpoint of the box
    pub fn offset(&self) -> DVec3 {
        (self.max + self.min) / 2.0
    }
}

/// The parsed, physically-scaled result of one analysis run
///
/// Constructed once per invocation and immutable thereafter; consumed by the
/// fragment serializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshProperties {
    /// Volume in cubic output-length units
    pub volume: f64,
    /// Mass in kg
    pub mass: f64,
    /// Center of mass in output length units
    pub center_of_mass: DVec3,
    /// Inertia tensor scaled to the resolved mass
    pub inertia: InertiaTensor,
    /// Present only when collision export was requested
    pub bounding_box: Option<BoundingBox>,
}

impl MeshProperties {
    /// Rescale a raw report into physical properties.
    ///
    /// Pure arithmetic on the parsed values; nothing is rounded until final
    /// text formatting.
    pub fn from_report(
        raw: &RawReport,
        units: UnitSystem,
        mass_spec: &MassSpec,
        with_bounding_box: bool,
    ) -> Result<Self, RescaleError> {
        let s = units.scale_factor();

        let volume = raw.volume * s.powi(3);
        if !volume.is_finite() || volume <= 0.0 {
            return Err(RescaleError::DegenerateVolume(raw.volume));
        }

        let mass = mass_spec.resolve(volume);
        let inertia = InertiaTensor::from_raw(&raw.inertia, s.powi(5) / volume * mass);

        let bounding_box = with_bounding_box.then(|| BoundingBox {
            min: raw.bbox_min * s,
            max: raw.bbox_max * s,
        });

        Ok(Self {
            volume,
            mass,
            center_of_mass: raw.center_of_mass * s,
            inertia,
            bounding_box,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawReport {
        RawReport {
            volume: 12.5,
            center_of_mass: DVec3::new(1.0, 2.0, 3.0),
            inertia: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            bbox_min: DVec3::new(-5.0, -5.0, -5.0),
            bbox_max: DVec3::new(5.0, 5.0, 5.0),
        }
    }

    #[test]
    fn test_mass_spec_resolution() {
        assert_eq!(MassSpec::from_options(None, None), Ok(MassSpec::Unit));
        assert_eq!(
            MassSpec::from_options(Some(2.5), None),
            Ok(MassSpec::Mass(2.5))
        );
        assert_eq!(
            MassSpec::from_options(None, Some(500.0)),
            Ok(MassSpec::Density(500.0))
        );
        assert_eq!(
            MassSpec::from_options(Some(2.5), Some(500.0)),
            Err(RescaleError::ConflictingMassSpec)
        );

        assert_eq!(MassSpec::Unit.resolve(0.1), 1.0);
        assert_eq!(MassSpec::Mass(2.5).resolve(0.1), 2.5);
        assert_eq!(MassSpec::Density(500.0).resolve(0.1), 50.0);
    }

    #[test]
    fn test_rescale_millimeters_default_mass() {
        let props = MeshProperties::from_report(
            &sample_raw(),
            UnitSystem::Millimeters,
            &MassSpec::Unit,
            false,
        )
        .unwrap();

        assert!((props.volume - 12.5e-9).abs() < 1e-18);
        assert_eq!(props.mass, 1.0);
        assert!((props.center_of_mass.x - 0.001).abs() < 1e-12);
        assert!((props.center_of_mass.y - 0.002).abs() < 1e-12);
        assert!((props.center_of_mass.z - 0.003).abs() < 1e-12);

        // raw * s^5 / volume * mass = 1e-15 / 12.5e-9 = 8e-8
        assert!((props.inertia.ixx - 8e-8).abs() < 1e-16);
        assert!((props.inertia.iyy - 8e-8).abs() < 1e-16);
        assert!((props.inertia.izz - 8e-8).abs() < 1e-16);
        assert_eq!(props.inertia.ixy, 0.0);
        assert!(props.bounding_box.is_none());
    }

    #[test]
    fn test_rescale_with_density() {
        let props = MeshProperties::from_report(
            &sample_raw(),
            UnitSystem::Millimeters,
            &MassSpec::Density(500.0),
            false,
        )
        .unwrap();

        // mass = 500 * 12.5e-9
        assert!((props.mass - 6.25e-6).abs() < 1e-15);
        // inertia scales proportionally to the resolved mass
        assert!((props.inertia.ixx - 8e-8 * 6.25e-6).abs() < 1e-22);
    }

    #[test]
    fn test_rescale_law_holds_for_both_unit_systems() {
        for units in [UnitSystem::Millimeters, UnitSystem::Meters] {
            let raw = sample_raw();
            let s = units.scale_factor();
            let props =
                MeshProperties::from_report(&raw, units, &MassSpec::Mass(3.0), true).unwrap();

            let volume = raw.volume * s.powi(3);
            assert!((props.volume - volume).abs() < 1e-18);
            assert!((props.center_of_mass.x - raw.center_of_mass.x * s).abs() < 1e-15);
            let expected_ixx = raw.inertia[0] * s.powi(5) / volume * 3.0;
            assert!((props.inertia.ixx - expected_ixx).abs() < 1e-15);

            let bbox = props.bounding_box.unwrap();
            assert!((bbox.min.x - raw.bbox_min.x * s).abs() < 1e-15);
            assert!((bbox.max.z - raw.bbox_max.z * s).abs() < 1e-15);
        }
    }

    #[test]
    fn test_bounding_box_size_and_offset() {
        let bbox = BoundingBox {
            min: DVec3::new(-0.005, -0.004, 0.001),
            max: DVec3::new(0.005, 0.006, 0.003),
        };
        assert!((bbox.size() - DVec3::new(0.01, 0.01, 0.002)).length() < 1e-12);
        assert!((bbox.offset() - DVec3::new(0.0, 0.001, 0.002)).length() < 1e-12);
    }

    #[test]
    fn test_zero_volume_is_rejected() {
        let mut raw = sample_raw();
        raw.volume = 0.0;
        let err =
            MeshProperties::from_report(&raw, UnitSystem::Millimeters, &MassSpec::Unit, false)
                .unwrap_err();
        assert_eq!(err, RescaleError::DegenerateVolume(0.0));
    }

    #[test]
    fn test_negative_volume_is_rejected() {
        let mut raw = sample_raw();
        raw.volume = -1.0;
        let err = MeshProperties::from_report(
            &raw,
            UnitSystem::Millimeters,
            &MassSpec::Density(100.0),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, RescaleError::DegenerateVolume(_)));
    }
}
