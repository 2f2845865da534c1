//! Mesh Inertia Core
//!
//! This crate contains the building blocks for deriving rigid-body inertial
//! parameters from a surface mesh:
//! - report: pattern matcher for the mesh analyzer's textual report
//! - properties: unit/mass rescaling into physical MeshProperties
//! - analyzer: abstraction over the external mesh-analysis tool
//! - fragment: URDF/SDF inertial-fragment serializers

pub mod analyzer;
pub mod fragment;
pub mod properties;
pub mod report;

pub use analyzer::*;
pub use fragment::*;
pub use properties::*;
pub use report::*;
