//! A stand-in tileset that reports attribution like a real one would.

use bevy::prelude::*;

use crate::credits::DefaultCreditDisplay;

/// Plugin for the demo tileset.
pub struct DemoTilesetPlugin;

impl Plugin for DemoTilesetPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, report_tileset_credits);
    }
}

/// Small logo used by the sample attribution.
const LOGO_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

/// A tileset and the attribution markup its visible tiles require.
#[derive(Component, Debug, Clone)]
pub struct DemoTileset {
    /// Markup and show-on-screen flag for each credit.
    pub credits: Vec<(String, bool)>,
}

impl Default for DemoTileset {
    fn default() -> Self {
        Self {
            credits: vec![
                (
                    format!(
                        "<a href=\"https://www.openstreetmap.org/copyright\">\
                         <img src=\"{LOGO_DATA_URI}\"> &copy; OpenStreetMap contributors</a>"
                    ),
                    true,
                ),
                ("Imagery &amp; terrain: sample data".to_string(), false),
            ],
        }
    }
}

/// Add every tileset's credits to the default display for this frame.
#[allow(clippy::needless_pass_by_value)]
fn report_tileset_credits(
    mut default_display: DefaultCreditDisplay,
    tilesets: Query<&DemoTileset>,
) {
    if tilesets.is_empty() {
        return;
    }
    let Some(mut display) = default_display.get_mut() else {
        return;
    };

    for tileset in &tilesets {
        for (html, show_on_screen) in &tileset.credits {
            display.show_credit(html, *show_on_screen);
        }
    }
}
