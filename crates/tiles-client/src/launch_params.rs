//! Launch parameter parsing.
//!
//! On native, the georeference origin can be set from the command line or a
//! JSON config file. On WASM, defaults are used.

use std::path::Path;

use bevy::prelude::*;
use tiles_georeference::GeoreferenceConfig;

use crate::error::{Error, Result};

/// Launch parameters for the client.
#[derive(Resource, Debug, Default)]
pub struct LaunchParams {
    /// Initial origin of the scene's georeference.
    pub georeference: GeoreferenceConfig,
}

/// Read a georeference configuration from a JSON file.
///
/// Missing fields take their defaults.
#[cfg_attr(target_family = "wasm", allow(dead_code))]
pub fn load_georeference_config(path: &Path) -> Result<GeoreferenceConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    #[command(about = "Globe tiles credits and georeference viewer")]
    pub(super) struct CliArgs {
        /// Origin longitude in degrees.
        #[arg(long, allow_negative_numbers = true)]
        pub longitude: Option<f64>,

        /// Origin latitude in degrees.
        #[arg(long, allow_negative_numbers = true)]
        pub latitude: Option<f64>,

        /// Origin height above the WGS84 ellipsoid in meters.
        #[arg(long, allow_negative_numbers = true)]
        pub height: Option<f64>,

        /// Origin in Earth-Centered-Earth-Fixed coordinates (meters).
        #[arg(
            long,
            num_args = 3,
            value_names = ["X", "Y", "Z"],
            allow_negative_numbers = true,
            conflicts_with_all = ["longitude", "latitude", "height"]
        )]
        pub ecef: Option<Vec<f64>>,

        /// JSON georeference config; command-line values override it.
        #[arg(long)]
        pub config: Option<PathBuf>,
    }

    impl CliArgs {
        pub fn into_launch_params(self) -> LaunchParams {
            let mut georeference = match &self.config {
                Some(path) => load_georeference_config(path).unwrap_or_else(|e| {
                    tracing::error!("{e}; using the default origin");
                    GeoreferenceConfig::default()
                }),
                None => GeoreferenceConfig::default(),
            };

            if let Some(&[x, y, z]) = self.ecef.as_deref() {
                georeference.set_origin_earth_centered_earth_fixed(x, y, z);
            } else if self.longitude.is_some() || self.latitude.is_some() || self.height.is_some() {
                georeference.set_origin_longitude_latitude_height(
                    self.longitude.unwrap_or(georeference.longitude),
                    self.latitude.unwrap_or(georeference.latitude),
                    self.height.unwrap_or(georeference.height),
                );
            }

            LaunchParams { georeference }
        }
    }

    pub fn parse() -> LaunchParams {
        CliArgs::parse().into_launch_params()
    }
}

/// Parse launch parameters from CLI args (native) or use defaults (WASM).
pub fn parse() -> LaunchParams {
    #[cfg(not(target_family = "wasm"))]
    {
        native::parse()
    }
    #[cfg(target_family = "wasm")]
    {
        LaunchParams::default()
    }
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use clap::Parser;
    use tiles_georeference::OriginAuthority;

    use super::native::CliArgs;
    use super::*;

    fn parse_args(args: &[&str]) -> LaunchParams {
        CliArgs::try_parse_from(std::iter::once("tiles-client").chain(args.iter().copied()))
            .unwrap()
            .into_launch_params()
    }

    #[test]
    fn test_defaults() {
        let params = parse_args(&[]);
        assert_eq!(params.georeference, GeoreferenceConfig::default());
    }

    #[test]
    fn test_geodetic_override_keeps_unset_fields() {
        let params = parse_args(&["--longitude", "-0.1276", "--latitude", "51.5072"]);
        let config = params.georeference;
        assert_eq!(config.origin_authority, OriginAuthority::LongitudeLatitudeHeight);
        assert_eq!(config.longitude, -0.1276);
        assert_eq!(config.latitude, 51.5072);
        assert_eq!(config.height, GeoreferenceConfig::default().height);
    }

    #[test]
    fn test_ecef_override() {
        let params = parse_args(&["--ecef", "0", "-6378137", "0"]);
        let config = params.georeference;
        assert_eq!(config.origin_authority, OriginAuthority::EarthCenteredEarthFixed);
        assert_eq!(config.ecef_y, -6_378_137.0);
        assert!((config.longitude + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_ecef_conflicts_with_geodetic() {
        let result = CliArgs::try_parse_from(["tiles-client", "--ecef", "1", "2", "3", "--height", "5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = load_georeference_config(Path::new("/nonexistent/georeference.json"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
