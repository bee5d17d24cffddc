//! Georeferencing for a globe-scale scene.
//!
//! The scene is laid out in a local tangent-plane frame (east, up, north)
//! anchored to a geographic origin on the WGS84 ellipsoid. This crate converts
//! between that frame and Earth-Centered-Earth-Fixed (ECEF) coordinates, and
//! re-orients anchored objects when the origin moves so that they keep their
//! orientation relative to the globe.
//!
//! All math is double precision (`glam::DVec3`, `DMat4`): ECEF coordinates are
//! millions of meters, far beyond what `f32` represents at centimeter scale.
//!
//! # Example
//!
//! ```
//! use glam::DVec3;
//! use tiles_georeference::{Georeference, GeoreferenceConfig};
//!
//! let mut config = GeoreferenceConfig::default();
//! config.set_origin_longitude_latitude_height(0.0, 0.0, 0.0);
//! let georeference = Georeference::new(config);
//!
//! // One meter north of the origin, which sits on the equator at 0° longitude.
//! let ecef = georeference.world_position_to_ecef(DVec3::new(0.0, 0.0, 1.0));
//! assert!((ecef - DVec3::new(6_378_137.0, 0.0, 1.0)).length() < 1e-6);
//! ```

mod anchor;
mod config;
mod decompose;
mod ellipsoid;
mod georeference;
mod local_frame;
mod relocate;

pub use anchor::{AnchoredObject, PositionAuthority};
pub use config::{GeoreferenceConfig, OriginAuthority};
pub use decompose::{RotationAndScale, matrix_to_rotation_and_scale};
pub use ellipsoid::{Cartographic, Ellipsoid};
pub use georeference::Georeference;
pub use local_frame::{LocalDirection, LocalFrame, Origin};
pub use relocate::{OriginRelocator, Relocation};
