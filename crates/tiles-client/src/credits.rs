//! Credit display entities.
//!
//! A credit display owns a credit registry. Tile producers add the credits
//! they need each frame, and the display rebuilds its popup and on-screen
//! texts whenever the set of shown credits changes.
//!
//! Most producers use the default display, found by name. When none exists
//! one is spawned from the credit display template, which is loaded once per
//! process and dropped on exit.

use std::sync::{Arc, Mutex, PoisonError};

use bevy::ecs::message::MessageReader;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::Deserialize;
use tiles_credits::{CreditFrameUpdater, CreditSystem, ImageLoader};

use crate::credit_images::{CreditImages, CreditImagesPlugin};

/// Name prefix that identifies the default credit display.
pub const DEFAULT_CREDIT_DISPLAY_NAME: &str = "CreditSystemDefault";

/// Plugin for credit displays.
pub struct CreditsPlugin;

impl Plugin for CreditsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(CreditImagesPlugin)
            .init_resource::<DefaultCreditDisplayRequested>()
            .add_systems(PreUpdate, spawn_default_credit_display)
            .add_systems(PostUpdate, update_credit_displays)
            .add_systems(Last, clear_credits_on_exit);
    }
}

/// A credit registry and the updater that formats it for display.
#[derive(Component, Default)]
#[require(CreditTexts)]
pub struct CreditDisplay {
    pub credits: CreditSystem,
    updater: CreditFrameUpdater,
}

impl CreditDisplay {
    /// Register `html` (if new) and show it this frame.
    pub fn show_credit(&mut self, html: &str, show_on_screen: bool) {
        let credit = self.credits.create_credit(html, show_on_screen);
        self.credits.add_credit_to_frame(credit);
    }
}

/// The formatted texts of a credit display, in rich-text form.
///
/// `popup` holds the full credit list; `on_screen` the credits shown over the
/// scene, ending with the popup link.
#[derive(Component, Debug, Default, Clone, PartialEq, Eq, Deref, DerefMut)]
pub struct CreditTexts(pub tiles_credits::CreditTexts);

/// Presentation settings of a credit display.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CreditTextStyle {
    pub font_size: f32,
}

impl Default for CreditTextStyle {
    fn default() -> Self {
        Self { font_size: 13.0 }
    }
}

/// Blueprint for spawning a default credit display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreditDisplayTemplate {
    pub name: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_font_size() -> f32 {
    CreditTextStyle::default().font_size
}

impl CreditDisplayTemplate {
    /// Parse the template bundled with the client.
    pub fn load() -> Option<Self> {
        let source = include_str!("../assets/credit_display.json");
        match serde_json::from_str(source) {
            Ok(template) => Some(template),
            Err(e) => {
                tracing::error!("Invalid credit display template: {e}");
                None
            }
        }
    }

    /// Components for a new display built from this template.
    pub fn instantiate(&self) -> (Name, CreditDisplay, CreditTextStyle) {
        (
            Name::new(self.name.clone()),
            CreditDisplay::default(),
            CreditTextStyle {
                font_size: self.font_size,
            },
        )
    }
}

static CREDIT_DISPLAY_TEMPLATE: Mutex<Option<Arc<CreditDisplayTemplate>>> = Mutex::new(None);

/// The process-wide credit display template, loaded on first use.
pub fn credit_display_template() -> Option<Arc<CreditDisplayTemplate>> {
    let mut cached = CREDIT_DISPLAY_TEMPLATE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if cached.is_none() {
        *cached = CreditDisplayTemplate::load().map(Arc::new);
    }
    cached.clone()
}

/// Drop the cached template; the next use reloads it.
pub fn clear_credit_system_template() {
    *CREDIT_DISPLAY_TEMPLATE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

/// Set when a producer asked for the default display and none existed.
#[derive(Resource, Default)]
struct DefaultCreditDisplayRequested(bool);

fn is_default_display(name: &Name) -> bool {
    name.as_str().starts_with(DEFAULT_CREDIT_DISPLAY_NAME)
}

/// Access to the default credit display.
///
/// If there is none, one is spawned before the next `Update`.
#[derive(SystemParam)]
pub struct DefaultCreditDisplay<'w, 's> {
    displays: Query<'w, 's, (&'static Name, &'static mut CreditDisplay)>,
    requested: ResMut<'w, DefaultCreditDisplayRequested>,
}

impl DefaultCreditDisplay<'_, '_> {
    pub fn get_mut(&mut self) -> Option<Mut<'_, CreditDisplay>> {
        let display = self
            .displays
            .iter_mut()
            .find(|(name, _)| is_default_display(name))
            .map(|(_, display)| display);
        if display.is_none() {
            self.requested.0 = true;
        }
        display
    }
}

#[allow(clippy::needless_pass_by_value)]
fn spawn_default_credit_display(
    mut commands: Commands,
    mut requested: ResMut<DefaultCreditDisplayRequested>,
    displays: Query<&Name, With<CreditDisplay>>,
) {
    if !std::mem::take(&mut requested.0) || displays.iter().any(is_default_display) {
        return;
    }

    let Some(template) = credit_display_template() else {
        return;
    };
    commands.spawn(template.instantiate());
    tracing::info!("Spawned default credit display {:?}", template.name);
}

/// Rebuild the texts of every credit display and advance its frame.
#[allow(clippy::needless_pass_by_value)]
fn update_credit_displays(
    mut displays: Query<(&mut CreditDisplay, &mut CreditTexts)>,
    mut images: ResMut<CreditImages>,
) {
    for (mut display, mut texts) in &mut displays {
        let display = &mut *display;
        display
            .updater
            .update(&mut display.credits, &mut *images, &mut texts.0);
    }
}

#[allow(clippy::needless_pass_by_value)]
fn clear_credits_on_exit(mut exits: MessageReader<AppExit>, mut images: ResMut<CreditImages>) {
    if exits.read().next().is_none() {
        return;
    }

    clear_credit_system_template();
    images.clear_loaded_images();
    tracing::info!("Released credit display template and credit images");
}

#[cfg(test)]
mod tests {
    use tiles_credits::DATA_ATTRIBUTION_LINK;

    use super::*;

    #[derive(Component)]
    struct Producer(&'static str);

    #[allow(clippy::needless_pass_by_value)]
    fn produce_credits(mut default_display: DefaultCreditDisplay, producers: Query<&Producer>) {
        let Some(mut display) = default_display.get_mut() else {
            return;
        };
        for producer in &producers {
            display.show_credit(producer.0, true);
        }
    }

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_resource::<CreditImages>()
            .init_resource::<DefaultCreditDisplayRequested>()
            .add_systems(PreUpdate, spawn_default_credit_display)
            .add_systems(Update, produce_credits)
            .add_systems(PostUpdate, update_credit_displays);
        app
    }

    fn default_display_texts(app: &mut App) -> Vec<tiles_credits::CreditTexts> {
        app.world_mut()
            .query::<(&Name, &CreditTexts)>()
            .iter(app.world())
            .filter(|(name, _)| is_default_display(name))
            .map(|(_, texts)| texts.0.clone())
            .collect()
    }

    #[test]
    fn test_template_loads() {
        let template = CreditDisplayTemplate::load().unwrap();
        assert!(template.name.starts_with(DEFAULT_CREDIT_DISPLAY_NAME));
        assert!(template.font_size > 0.0);
    }

    #[test]
    fn test_default_display_spawned_once() {
        let mut app = test_app();
        app.world_mut()
            .spawn(Producer("<a href='https://a.example'>A</a>"));

        // First frame requests the display; the second spawns it.
        app.update();
        assert!(default_display_texts(&mut app).is_empty());
        app.update();
        app.update();

        let texts = default_display_texts(&mut app);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].popup, "<link=\"https://a.example\">A</link>");
        assert_eq!(
            texts[0].on_screen,
            format!("<link=\"https://a.example\">A</link>{DATA_ATTRIBUTION_LINK}")
        );
    }

    #[test]
    fn test_existing_display_is_found_by_prefix() {
        let mut app = test_app();
        app.world_mut()
            .spawn((Name::new("CreditSystemDefault (custom)"), CreditDisplay::default()));
        app.world_mut().spawn(Producer("Custom"));

        app.update();
        app.update();

        let texts = default_display_texts(&mut app);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].popup, "Custom");
    }

    #[test]
    fn test_credit_images_requested_once() {
        let mut app = test_app();
        app.world_mut()
            .spawn(Producer("<img src='https://a.example/logo.png'>"));

        for _ in 0..4 {
            app.update();
        }

        let images = app.world().resource::<CreditImages>();
        assert_eq!(images.image_count(), 1);
        assert_eq!(images.url(0), Some("https://a.example/logo.png"));
    }

    #[test]
    fn test_exit_clears_images() {
        let mut app = test_app();
        app.add_systems(Last, clear_credits_on_exit);
        app.world_mut()
            .resource_mut::<CreditImages>()
            .request_load("https://a.example/logo.png");

        app.world_mut().write_message(AppExit::Success);
        app.update();

        assert_eq!(app.world().resource::<CreditImages>().image_count(), 0);
    }

    #[test]
    fn test_template_reloads_after_clear() {
        let first = credit_display_template().unwrap();
        clear_credit_system_template();
        let second = credit_display_template().unwrap();
        assert_eq!(*first, *second);
    }
}
