//! Egui overlay: on-screen credits, the attribution popup and the origin
//! editor.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};
use tiles_credits::{ImageLoader, RichSpan, rich_text_spans};
use tiles_georeference::OriginAuthority;

use crate::credit_images::CreditImages;
use crate::credits::{CreditDisplay, CreditTextStyle, CreditTexts};
use crate::georeference::{GeoreferenceOrigin, GlobeAnchor};

/// Link target that toggles the attribution popup.
const POPUP_LINK: &str = "popup";

/// Plugin for the egui overlay.
pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default()).add_systems(
            EguiPrimaryContextPass,
            (credits_overlay_system, georeference_window_system),
        );
    }
}

/// Egui textures for loaded credit images.
#[derive(Default)]
struct CreditTextures(HashMap<AssetId<Image>, egui::TextureHandle>);

impl CreditTextures {
    fn get(
        &mut self,
        ctx: &egui::Context,
        handle: &Handle<Image>,
        assets: &Assets<Image>,
    ) -> Option<egui::TextureHandle> {
        let id = handle.id();
        if let Some(texture) = self.0.get(&id) {
            return Some(texture.clone());
        }

        let image = assets.get(id)?;
        let data = image.data.as_ref()?;
        let size = [image.width() as usize, image.height() as usize];
        let texture = ctx.load_texture(
            format!("{id:?}"),
            egui::ColorImage::from_rgba_unmultiplied(size, data),
            egui::TextureOptions::LINEAR,
        );
        self.0.insert(id, texture.clone());
        Some(texture)
    }
}

/// Credit displays whose attribution popup is open.
#[derive(Default)]
struct OpenPopups(HashSet<Entity>);

impl OpenPopups {
    fn is_open(&self, display: Entity) -> bool {
        self.0.contains(&display)
    }

    fn set_open(&mut self, display: Entity, open: bool) {
        if open {
            self.0.insert(display);
        } else {
            self.0.remove(&display);
        }
    }

    fn toggle(&mut self, display: Entity) {
        self.set_open(display, !self.is_open(display));
    }
}

/// What a click on a credit asks for.
enum CreditAction {
    TogglePopup,
    OpenUrl(String),
}

/// Lay out rich-text spans, returning the action of any clicked link.
fn show_spans(
    ui: &mut egui::Ui,
    spans: &[RichSpan],
    font_size: f32,
    images: &CreditImages,
    assets: &Assets<Image>,
    textures: &mut CreditTextures,
) -> Option<CreditAction> {
    let mut action = None;
    let link_action = |link: &str| {
        if link == POPUP_LINK {
            CreditAction::TogglePopup
        } else {
            CreditAction::OpenUrl(link.to_string())
        }
    };

    for span in spans {
        match span {
            RichSpan::Text {
                text,
                link,
                underline,
            } => {
                let mut rich = egui::RichText::new(text.as_str()).size(font_size);
                if *underline {
                    rich = rich.underline();
                }
                let clicked = match link {
                    Some(_) => ui.link(rich).clicked(),
                    None => {
                        ui.label(rich);
                        false
                    }
                };
                if clicked && let Some(link) = link {
                    action = Some(link_action(link));
                }
            }
            RichSpan::Sprite { index, link } => {
                // Unloaded images take no space until they arrive.
                let Some(texture) = images
                    .image(*index)
                    .and_then(|handle| textures.get(ui.ctx(), handle, assets))
                else {
                    continue;
                };

                let [width, height] = texture.size_vec2().into();
                let scale = (font_size * 1.5) / height.max(1.0);
                let size = egui::vec2(width * scale, height * scale);
                let image = egui::Image::new(egui::load::SizedTexture::new(texture.id(), size))
                    .sense(egui::Sense::click());
                let mut response = ui.add(image);
                if let Some(url) = images.url(*index)
                    && !url.starts_with("data:")
                {
                    response = response.on_hover_text(url);
                }
                if response.clicked()
                    && let Some(link) = link
                {
                    action = Some(link_action(link));
                }
            }
        }
    }

    action
}

/// Render each credit display's on-screen credits and its popup.
#[allow(clippy::needless_pass_by_value)]
fn credits_overlay_system(
    mut contexts: EguiContexts,
    displays: Query<(Entity, &CreditTexts, Option<&CreditTextStyle>), With<CreditDisplay>>,
    images: Res<CreditImages>,
    assets: Res<Assets<Image>>,
    mut textures: Local<CreditTextures>,
    mut popups: Local<OpenPopups>,
) -> Result {
    let ctx = contexts.ctx_mut()?.clone();

    popups.0.retain(|&display| displays.contains(display));

    for (display, texts, style) in &displays {
        let font_size = style.copied().unwrap_or_default().font_size;

        let on_screen = rich_text_spans(&texts.on_screen);
        let action = egui::Area::new(egui::Id::new(("credits", display)))
            .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
            .show(&ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    show_spans(ui, &on_screen, font_size, &images, &assets, &mut textures)
                })
                .inner
            })
            .inner;

        match action {
            Some(CreditAction::TogglePopup) => popups.toggle(display),
            Some(CreditAction::OpenUrl(url)) => ctx.open_url(egui::OpenUrl::new_tab(url)),
            None => {}
        }

        if !popups.is_open(display) {
            continue;
        }

        let popup = rich_text_spans(&texts.popup);
        let mut open = true;
        let action = egui::Window::new("Data Attribution")
            .id(egui::Id::new(("data_attribution", display)))
            .open(&mut open)
            .default_pos([10.0, 200.0])
            .show(&ctx, |ui| {
                ui.small(format!(
                    "{} of {} credit images loaded",
                    images.loaded_count(),
                    images.image_count()
                ));
                if popup.is_empty() {
                    ui.label("No data sources are shown.");
                    return None;
                }
                ui.horizontal_wrapped(|ui| {
                    show_spans(ui, &popup, font_size, &images, &assets, &mut textures)
                })
                .inner
            })
            .and_then(|response| response.inner.flatten());
        popups.set_open(display, open);

        match action {
            Some(CreditAction::TogglePopup) => popups.set_open(display, false),
            Some(CreditAction::OpenUrl(url)) => ctx.open_url(egui::OpenUrl::new_tab(url)),
            None => {}
        }
    }

    Ok(())
}

/// Edit the scene origin and list the anchored objects.
#[allow(clippy::needless_pass_by_value)]
fn georeference_window_system(
    mut contexts: EguiContexts,
    mut origins: Query<&mut GeoreferenceOrigin>,
    anchors: Query<(Option<&Name>, &GlobeAnchor)>,
) -> Result {
    let ctx = contexts.ctx_mut()?;

    egui::Window::new("Georeference")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            for mut origin in &mut origins {
                let mut edited = origin.0.clone();
                let mut changed = false;

                ui.horizontal(|ui| {
                    changed |= ui
                        .radio_value(
                            &mut edited.origin_authority,
                            OriginAuthority::LongitudeLatitudeHeight,
                            "Longitude/latitude/height",
                        )
                        .changed();
                    changed |= ui
                        .radio_value(
                            &mut edited.origin_authority,
                            OriginAuthority::EarthCenteredEarthFixed,
                            "ECEF",
                        )
                        .changed();
                });

                match edited.origin_authority {
                    OriginAuthority::LongitudeLatitudeHeight => {
                        ui.horizontal(|ui| {
                            changed |= drag(ui, "Longitude", &mut edited.longitude, 0.001, "°");
                            changed |= drag(ui, "Latitude", &mut edited.latitude, 0.001, "°");
                            changed |= drag(ui, "Height", &mut edited.height, 1.0, " m");
                        });
                        if changed {
                            edited.set_origin_longitude_latitude_height(
                                edited.longitude.clamp(-180.0, 180.0),
                                edited.latitude.clamp(-90.0, 90.0),
                                edited.height,
                            );
                        }
                    }
                    OriginAuthority::EarthCenteredEarthFixed => {
                        ui.horizontal(|ui| {
                            changed |= drag(ui, "X", &mut edited.ecef_x, 10.0, " m");
                            changed |= drag(ui, "Y", &mut edited.ecef_y, 10.0, " m");
                            changed |= drag(ui, "Z", &mut edited.ecef_z, 10.0, " m");
                        });
                        if changed {
                            edited.set_origin_earth_centered_earth_fixed(
                                edited.ecef_x,
                                edited.ecef_y,
                                edited.ecef_z,
                            );
                        }
                    }
                }

                if changed && edited != origin.0 {
                    origin.0 = edited;
                }
            }

            ui.separator();
            ui.label("Anchors:");
            for (name, anchor) in &anchors {
                let llh = anchor.longitude_latitude_height;
                ui.label(format!(
                    "{}: {:.5}°, {:.5}°, {:.1} m ({:?})",
                    name.map_or("(unnamed)", Name::as_str),
                    llh.x,
                    llh.y,
                    llh.z,
                    anchor.authority
                ));
            }
        });

    Ok(())
}

fn drag(ui: &mut egui::Ui, label: &str, value: &mut f64, speed: f64, suffix: &str) -> bool {
    ui.label(label);
    ui.add(egui::DragValue::new(value).speed(speed).suffix(suffix))
        .changed()
}
