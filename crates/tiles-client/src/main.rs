//! Viewer for tile attribution credits and globe georeferencing.
//!
//! Spawns a georeferenced scene root with a few globe-anchored objects and a
//! demo tileset that reports attribution. The overlay shows the credits and
//! lets the origin be moved; anchored objects keep their place on the globe.

mod async_runtime;
mod credit_images;
mod credits;
mod demo;
mod error;
mod georeference;
mod launch_params;
mod overlay;

use async_runtime::AsyncRuntimePlugin;
use bevy::prelude::*;
use credits::CreditsPlugin;
use demo::{DemoTileset, DemoTilesetPlugin};
use georeference::{GeoreferenceOrigin, GeoreferencePlugin, GlobeAnchor};
use launch_params::LaunchParams;
use overlay::OverlayPlugin;

/// Plugin for the main application.
pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            CreditsPlugin,
            GeoreferencePlugin,
            DemoTilesetPlugin,
            OverlayPlugin,
        ))
        .add_systems(Startup, setup_scene);
    }
}

/// Set up the georeferenced scene.
#[allow(clippy::needless_pass_by_value)]
fn setup_scene(
    mut commands: Commands,
    params: Res<LaunchParams>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let origin = params.georeference.clone();

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 60.0, -120.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(50.0, 100.0, -30.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let cube = meshes.add(Cuboid::new(10.0, 10.0, 10.0));
    let ground = meshes.add(Plane3d::default().mesh().size(200.0, 200.0));

    commands
        .spawn((
            Name::new("Georeference"),
            GeoreferenceOrigin(origin.clone()),
            Visibility::default(),
        ))
        .with_children(|root| {
            root.spawn((
                Name::new("Ground"),
                Mesh3d(ground),
                MeshMaterial3d(materials.add(Color::srgb(0.3, 0.5, 0.3))),
            ));

            // Placed by the globe: stays put when the origin moves.
            root.spawn((
                Name::new("Globe marker"),
                GlobeAnchor::from_longitude_latitude_height(
                    origin.longitude + 0.0005,
                    origin.latitude,
                    origin.height + 5.0,
                ),
                Mesh3d(cube.clone()),
                MeshMaterial3d(materials.add(Color::srgb(0.8, 0.2, 0.2))),
            ));

            // Placed in the scene: becomes globe-placed on the first relocation.
            root.spawn((
                Name::new("Scene marker"),
                GlobeAnchor::default(),
                Transform::from_xyz(0.0, 5.0, 30.0),
                Mesh3d(cube.clone()),
                MeshMaterial3d(materials.add(Color::srgb(0.2, 0.2, 0.8))),
            ));

            // Forty meters above the origin, along the ECEF radial.
            let ecef = origin.ecef();
            root.spawn((
                Name::new("Radial marker"),
                GlobeAnchor::from_ecef(ecef + ecef.normalize() * 40.0),
                Mesh3d(cube),
                MeshMaterial3d(materials.add(Color::srgb(0.9, 0.8, 0.2))),
            ));
        });

    commands.spawn((Name::new("Demo tileset"), DemoTileset::default()));

    tracing::info!(
        "Scene setup complete - origin at {:.5}°, {:.5}°, {:.0} m",
        origin.longitude,
        origin.latitude,
        origin.height
    );
}

fn main() {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let params = launch_params::parse();

    let mut app = App::new();

    #[allow(unused_mut)]
    let mut window = Window {
        title: "tiles-client".to_string(),
        resolution: (1280, 720).into(),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..Default::default()
    }))
    .add_plugins(AsyncRuntimePlugin)
    .insert_resource(params)
    .add_plugins(AppPlugin)
    .run();
}
