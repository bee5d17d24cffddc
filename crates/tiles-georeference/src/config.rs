//! Georeference origin configuration.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::ellipsoid::{Cartographic, Ellipsoid};
use crate::local_frame::Origin;

/// Which representation of the origin is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginAuthority {
    #[default]
    LongitudeLatitudeHeight,
    EarthCenteredEarthFixed,
}

/// The geographic origin of the scene.
///
/// Both representations are stored; the setters keep them in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoreferenceConfig {
    #[serde(default)]
    pub origin_authority: OriginAuthority,
    /// Degrees.
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Degrees.
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    /// Meters above the WGS84 ellipsoid.
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_ecef_x")]
    pub ecef_x: f64,
    #[serde(default)]
    pub ecef_y: f64,
    #[serde(default)]
    pub ecef_z: f64,
}

fn default_longitude() -> f64 {
    -105.257_37
}

fn default_latitude() -> f64 {
    39.736_401
}

fn default_height() -> f64 {
    2250.0
}

fn default_ecef_x() -> f64 {
    6_378_137.0
}

impl Default for GeoreferenceConfig {
    fn default() -> Self {
        Self {
            origin_authority: OriginAuthority::default(),
            longitude: default_longitude(),
            latitude: default_latitude(),
            height: default_height(),
            ecef_x: default_ecef_x(),
            ecef_y: 0.0,
            ecef_z: 0.0,
        }
    }
}

impl GeoreferenceConfig {
    /// Set the origin from geodetic coordinates and make them authoritative.
    pub fn set_origin_longitude_latitude_height(
        &mut self,
        longitude: f64,
        latitude: f64,
        height: f64,
    ) {
        self.longitude = longitude;
        self.latitude = latitude;
        self.height = height;
        self.origin_authority = OriginAuthority::LongitudeLatitudeHeight;

        let ecef = Ellipsoid::WGS84
            .cartographic_to_cartesian(Cartographic::from_degrees(longitude, latitude, height));
        self.ecef_x = ecef.x;
        self.ecef_y = ecef.y;
        self.ecef_z = ecef.z;
    }

    /// Set the origin from ECEF coordinates and make them authoritative.
    ///
    /// Longitude, latitude and height are left unchanged when the point has
    /// no geodetic equivalent (near Earth's center).
    pub fn set_origin_earth_centered_earth_fixed(&mut self, x: f64, y: f64, z: f64) {
        self.ecef_x = x;
        self.ecef_y = y;
        self.ecef_z = z;
        self.origin_authority = OriginAuthority::EarthCenteredEarthFixed;

        if let Some(cartographic) =
            Ellipsoid::WGS84.cartesian_to_cartographic(DVec3::new(x, y, z))
        {
            let degrees = cartographic.to_degrees();
            self.longitude = degrees.x;
            self.latitude = degrees.y;
            self.height = degrees.z;
        }
    }

    #[must_use]
    pub fn ecef(&self) -> DVec3 {
        DVec3::new(self.ecef_x, self.ecef_y, self.ecef_z)
    }

    /// The authoritative origin.
    #[must_use]
    pub fn origin(&self) -> Origin {
        match self.origin_authority {
            OriginAuthority::LongitudeLatitudeHeight => Origin::Geodetic {
                longitude: self.longitude,
                latitude: self.latitude,
                height: self.height,
            },
            OriginAuthority::EarthCenteredEarthFixed => Origin::Ecef(self.ecef()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeoreferenceConfig::default();
        assert_eq!(
            config.origin_authority,
            OriginAuthority::LongitudeLatitudeHeight
        );
        assert_eq!(
            config.origin(),
            Origin::Geodetic {
                longitude: -105.257_37,
                latitude: 39.736_401,
                height: 2250.0,
            }
        );
        assert_eq!(config.ecef(), DVec3::new(6_378_137.0, 0.0, 0.0));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: GeoreferenceConfig =
            serde_json::from_str(r#"{ "origin_authority": "earth_centered_earth_fixed", "ecef_z": 10.0 }"#)
                .unwrap();
        assert_eq!(
            config.origin(),
            Origin::Ecef(DVec3::new(6_378_137.0, 0.0, 10.0))
        );
        assert_eq!(config.latitude, 39.736_401);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut config = GeoreferenceConfig::default();
        config.set_origin_longitude_latitude_height(2.35, 48.85, 35.0);

        let json = serde_json::to_string(&config).unwrap();
        let parsed: GeoreferenceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_setters_keep_representations_in_sync() {
        let mut config = GeoreferenceConfig::default();
        config.set_origin_longitude_latitude_height(0.0, 0.0, 100.0);
        assert!((config.ecef() - DVec3::new(6_378_237.0, 0.0, 0.0)).length() < 1e-6);

        config.set_origin_earth_centered_earth_fixed(0.0, 6_378_137.0, 0.0);
        assert_eq!(
            config.origin_authority,
            OriginAuthority::EarthCenteredEarthFixed
        );
        assert!((config.longitude - 90.0).abs() < 1e-9);
        assert!(config.latitude.abs() < 1e-9);
        assert!(config.height.abs() < 1e-6);
    }

    #[test]
    fn test_ecef_at_center_keeps_geodetic() {
        let mut config = GeoreferenceConfig::default();
        config.set_origin_longitude_latitude_height(10.0, 20.0, 30.0);
        config.set_origin_earth_centered_earth_fixed(0.0, 0.0, 0.0);

        assert_eq!(config.origin(), Origin::Ecef(DVec3::ZERO));
        assert_eq!(
            (config.longitude, config.latitude, config.height),
            (10.0, 20.0, 30.0)
        );
    }
}
