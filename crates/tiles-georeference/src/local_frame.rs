//! Local tangent-plane coordinate frames.

use glam::{DMat3, DMat4, DVec3, DVec4};

use crate::ellipsoid::{Cartographic, Ellipsoid};

/// Components this close to zero count as zero when classifying an origin.
const AXIS_EPSILON: f64 = 1e-14;

/// A compass or vertical direction on the tangent plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalDirection {
    East,
    North,
    West,
    South,
    Up,
    Down,
}

impl LocalDirection {
    /// The direction in east-north-up coordinates.
    fn to_enu(self) -> DVec3 {
        match self {
            Self::East => DVec3::X,
            Self::North => DVec3::Y,
            Self::West => DVec3::NEG_X,
            Self::South => DVec3::NEG_Y,
            Self::Up => DVec3::Z,
            Self::Down => DVec3::NEG_Z,
        }
    }
}

/// Where a frame is anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Origin {
    /// Longitude and latitude in degrees, height in meters.
    Geodetic {
        longitude: f64,
        latitude: f64,
        height: f64,
    },
    /// Earth-Centered-Earth-Fixed position in meters.
    Ecef(DVec3),
}

impl Origin {
    /// The origin as an ECEF position on `ellipsoid`.
    #[must_use]
    pub fn to_ecef(self, ellipsoid: &Ellipsoid) -> DVec3 {
        match self {
            Self::Geodetic {
                longitude,
                latitude,
                height,
            } => ellipsoid
                .cartographic_to_cartesian(Cartographic::from_degrees(longitude, latitude, height)),
            Self::Ecef(position) => position,
        }
    }
}

/// A Cartesian frame tangent to the ellipsoid at an origin.
///
/// Holds the local→ECEF transform and its inverse. Frames are immutable;
/// moving the origin means building a new frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    local_to_ecef: DMat4,
    ecef_to_local: DMat4,
}

impl LocalFrame {
    /// Build the scene frame at `origin` on WGS84: +X east, +Y up, +Z north,
    /// one unit per meter.
    #[must_use]
    pub fn from_origin(origin: Origin) -> Self {
        let ellipsoid = Ellipsoid::WGS84;
        Self::new(
            origin.to_ecef(&ellipsoid),
            LocalDirection::East,
            LocalDirection::Up,
            LocalDirection::North,
            1.0,
            &ellipsoid,
        )
    }

    /// Build a frame at `origin_ecef` with arbitrary axis directions.
    ///
    /// `scale_to_meters` is the length of one local unit in meters.
    #[must_use]
    pub fn new(
        origin_ecef: DVec3,
        x_axis: LocalDirection,
        y_axis: LocalDirection,
        z_axis: LocalDirection,
        scale_to_meters: f64,
        ellipsoid: &Ellipsoid,
    ) -> Self {
        let enu_to_ecef = east_north_up_to_ecef(origin_ecef, ellipsoid);
        let local_to_enu = DMat4::from_mat3(DMat3::from_cols(
            x_axis.to_enu() * scale_to_meters,
            y_axis.to_enu() * scale_to_meters,
            z_axis.to_enu() * scale_to_meters,
        ));
        let local_to_ecef = enu_to_ecef * local_to_enu;

        // The linear part is orthogonal with uniform scale, so its inverse is
        // its transpose divided by the squared scale.
        let linear = DMat3::from_mat4(local_to_ecef);
        let inverse_linear = linear.transpose() * (1.0 / (scale_to_meters * scale_to_meters));
        let mut ecef_to_local = DMat4::from_mat3(inverse_linear);
        ecef_to_local.w_axis = (-(inverse_linear * origin_ecef)).extend(1.0);

        Self {
            local_to_ecef,
            ecef_to_local,
        }
    }

    /// Wrap an existing local→ECEF transform. The inverse is computed
    /// numerically.
    #[must_use]
    pub fn from_local_to_ecef(local_to_ecef: DMat4) -> Self {
        Self {
            local_to_ecef,
            ecef_to_local: local_to_ecef.inverse(),
        }
    }

    #[must_use]
    pub fn local_to_ecef(&self) -> DMat4 {
        self.local_to_ecef
    }

    #[must_use]
    pub fn ecef_to_local(&self) -> DMat4 {
        self.ecef_to_local
    }

    /// The frame origin in ECEF.
    #[must_use]
    pub fn origin_ecef(&self) -> DVec3 {
        self.local_to_ecef.w_axis.truncate()
    }

    #[must_use]
    pub fn local_position_to_ecef(&self, position: DVec3) -> DVec3 {
        self.local_to_ecef.transform_point3(position)
    }

    #[must_use]
    pub fn ecef_position_to_local(&self, position: DVec3) -> DVec3 {
        self.ecef_to_local.transform_point3(position)
    }

    #[must_use]
    pub fn local_direction_to_ecef(&self, direction: DVec3) -> DVec3 {
        self.local_to_ecef.transform_vector3(direction)
    }

    #[must_use]
    pub fn ecef_direction_to_local(&self, direction: DVec3) -> DVec3 {
        self.ecef_to_local.transform_vector3(direction)
    }
}

/// Transform from east-north-up axes at `origin` to ECEF.
fn east_north_up_to_ecef(origin: DVec3, ellipsoid: &Ellipsoid) -> DMat4 {
    let on_axis = origin.x.abs() < AXIS_EPSILON && origin.y.abs() < AXIS_EPSILON;

    let (east, north, up) = if on_axis && origin.z.abs() < AXIS_EPSILON {
        // Earth's center.
        (DVec3::Y, DVec3::NEG_X, DVec3::Z)
    } else if on_axis {
        // A pole: east is ambiguous, pick the one continuous with +0° longitude.
        let sign = origin.z.signum();
        (DVec3::Y, DVec3::new(-sign, 0.0, 0.0), DVec3::new(0.0, 0.0, sign))
    } else {
        let up = ellipsoid.geodetic_surface_normal(origin);
        let east = DVec3::new(-origin.y, origin.x, 0.0).normalize();
        (east, up.cross(east), up)
    };

    DMat4::from_cols(
        east.extend(0.0),
        north.extend(0.0),
        up.extend(0.0),
        DVec4::new(origin.x, origin.y, origin.z, 1.0),
    )
}
