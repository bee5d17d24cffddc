//! Ellipsoid geometry and geodetic coordinates.

use glam::DVec3;

/// Points closer than this (squared, in radii-scaled units) to the center have
/// no well-defined surface projection.
const CENTER_TOLERANCE_SQUARED: f64 = 0.1;

/// Convergence threshold of the surface projection iteration.
const PROJECTION_EPSILON: f64 = 1e-12;

/// A geodetic position: longitude and latitude in radians, height in meters
/// above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cartographic {
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

impl Cartographic {
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    /// Create from longitude and latitude in degrees.
    #[must_use]
    pub fn from_degrees(longitude: f64, latitude: f64, height: f64) -> Self {
        Self::new(longitude.to_radians(), latitude.to_radians(), height)
    }

    /// Longitude and latitude in degrees, height in meters, as `(x, y, z)`.
    #[must_use]
    pub fn to_degrees(self) -> DVec3 {
        DVec3::new(
            self.longitude.to_degrees(),
            self.latitude.to_degrees(),
            self.height,
        )
    }
}

/// An ellipsoid of revolution centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    radii: DVec3,
    radii_squared: DVec3,
    one_over_radii: DVec3,
    one_over_radii_squared: DVec3,
}

impl Ellipsoid {
    /// The WGS84 reference ellipsoid.
    pub const WGS84: Self = Self::new(6_378_137.0, 6_378_137.0, 6_356_752.314_245_179_3);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            radii: DVec3::new(x, y, z),
            radii_squared: DVec3::new(x * x, y * y, z * z),
            one_over_radii: DVec3::new(1.0 / x, 1.0 / y, 1.0 / z),
            one_over_radii_squared: DVec3::new(1.0 / (x * x), 1.0 / (y * y), 1.0 / (z * z)),
        }
    }

    #[must_use]
    pub fn radii(&self) -> DVec3 {
        self.radii
    }

    /// Unit normal of the ellipsoid surface through `position`.
    ///
    /// Undefined (NaN) at the center.
    #[must_use]
    pub fn geodetic_surface_normal(&self, position: DVec3) -> DVec3 {
        (position * self.one_over_radii_squared).normalize()
    }

    /// Unit surface normal at a geodetic position.
    #[must_use]
    pub fn geodetic_surface_normal_cartographic(&self, cartographic: Cartographic) -> DVec3 {
        let (sin_lon, cos_lon) = cartographic.longitude.sin_cos();
        let (sin_lat, cos_lat) = cartographic.latitude.sin_cos();
        DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat).normalize()
    }

    /// Convert a geodetic position to ECEF.
    #[must_use]
    pub fn cartographic_to_cartesian(&self, cartographic: Cartographic) -> DVec3 {
        let n = self.geodetic_surface_normal_cartographic(cartographic);
        let k = self.radii_squared * n;
        let gamma = n.dot(k).sqrt();
        k / gamma + n * cartographic.height
    }

    /// Project `position` onto the surface along the geodetic normal.
    ///
    /// Returns `None` for positions too close to the center.
    #[must_use]
    pub fn scale_to_geodetic_surface(&self, position: DVec3) -> Option<DVec3> {
        let scaled = position * self.one_over_radii;
        let squared = scaled * scaled;
        let squared_norm = squared.x + squared.y + squared.z;
        let ratio = (1.0 / squared_norm).sqrt();

        // Initial guess: scale along the geocentric direction.
        let intersection = position * ratio;
        if squared_norm < CENTER_TOLERANCE_SQUARED {
            return ratio.is_finite().then_some(intersection);
        }

        let gradient = intersection * self.one_over_radii_squared * 2.0;
        let mut lambda = (1.0 - ratio) * position.length() / (0.5 * gradient.length());
        let mut correction = 0.0;
        let mut multiplier;

        // Newton's method on lambda.
        loop {
            lambda -= correction;

            multiplier = DVec3::ONE / (DVec3::ONE + self.one_over_radii_squared * lambda);
            let multiplier_squared = multiplier * multiplier;
            let multiplier_cubed = multiplier_squared * multiplier;

            let func = squared.dot(multiplier_squared) - 1.0;
            let denominator = (squared * multiplier_cubed).dot(self.one_over_radii_squared);
            let derivative = -2.0 * denominator;
            correction = func / derivative;

            if func.abs() <= PROJECTION_EPSILON {
                break;
            }
        }

        Some(position * multiplier)
    }

    /// Convert an ECEF position to geodetic.
    ///
    /// Returns `None` for positions too close to the center.
    #[must_use]
    pub fn cartesian_to_cartographic(&self, position: DVec3) -> Option<Cartographic> {
        let surface = self.scale_to_geodetic_surface(position)?;
        let normal = self.geodetic_surface_normal(surface);
        let height_vector = position - surface;

        let longitude = normal.y.atan2(normal.x);
        let latitude = normal.z.asin();
        let height = height_vector.dot(position).signum() * height_vector.length();

        Some(Cartographic::new(longitude, latitude, height))
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WGS84: Ellipsoid = Ellipsoid::WGS84;

    fn assert_close(a: DVec3, b: DVec3, tolerance: f64) {
        assert!(
            (a - b).length() < tolerance,
            "{a} and {b} differ by {}",
            (a - b).length()
        );
    }

    #[test]
    fn test_cartographic_to_cartesian_axes() {
        assert_close(
            WGS84.cartographic_to_cartesian(Cartographic::from_degrees(0.0, 0.0, 0.0)),
            DVec3::new(6_378_137.0, 0.0, 0.0),
            1e-6,
        );
        assert_close(
            WGS84.cartographic_to_cartesian(Cartographic::from_degrees(90.0, 0.0, 100.0)),
            DVec3::new(0.0, 6_378_237.0, 0.0),
            1e-6,
        );
        assert_close(
            WGS84.cartographic_to_cartesian(Cartographic::from_degrees(0.0, 90.0, 0.0)),
            DVec3::new(0.0, 0.0, 6_356_752.314_245_179_3),
            1e-6,
        );
    }

    #[test]
    fn test_cartesian_to_cartographic_below_surface() {
        let cartographic = WGS84
            .cartesian_to_cartographic(DVec3::new(6_378_000.0, 0.0, 0.0))
            .unwrap();
        assert!(cartographic.longitude.abs() < 1e-12);
        assert!(cartographic.latitude.abs() < 1e-12);
        assert!((cartographic.height + 137.0).abs() < 1e-6);
    }

    #[test]
    fn test_center_has_no_cartographic() {
        assert_eq!(WGS84.scale_to_geodetic_surface(DVec3::ZERO), None);
        assert_eq!(WGS84.cartesian_to_cartographic(DVec3::ZERO), None);
    }

    #[test]
    fn test_surface_normal_matches_cartographic_normal() {
        let cartographic = Cartographic::from_degrees(-105.25737, 39.736401, 2250.0);
        let position = WGS84.cartographic_to_cartesian(cartographic);
        assert_close(
            WGS84.geodetic_surface_normal(position),
            WGS84.geodetic_surface_normal_cartographic(cartographic),
            1e-9,
        );
    }

    #[test]
    fn test_degrees_conversion() {
        let degrees = Cartographic::from_degrees(-105.25, 39.5, 12.0).to_degrees();
        assert_close(degrees, DVec3::new(-105.25, 39.5, 12.0), 1e-12);
    }

    proptest! {
        #[test]
        fn prop_cartographic_round_trip(
            longitude in -179.9f64..179.9,
            latitude in -89.9f64..89.9,
            height in -1000.0f64..100_000.0,
        ) {
            let original = Cartographic::from_degrees(longitude, latitude, height);
            let position = WGS84.cartographic_to_cartesian(original);
            let round_trip = WGS84.cartesian_to_cartographic(position).unwrap();

            prop_assert!((round_trip.longitude - original.longitude).abs() < 1e-9);
            prop_assert!((round_trip.latitude - original.latitude).abs() < 1e-9);
            prop_assert!((round_trip.height - original.height).abs() < 1e-4);
        }
    }
}
