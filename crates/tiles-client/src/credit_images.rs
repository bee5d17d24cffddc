//! Fetching and decoding the images referenced by credit markup.
//!
//! The credit converter reserves an image slot synchronously for every
//! `<img>` it meets. The fetch itself runs in the background and the decoded
//! image is placed into its reserved slot when it arrives, so sprite indices
//! never depend on completion order.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use tiles_credits::{ImageLoader, ImageSlots};

use crate::async_runtime::TaskSpawner;
use crate::error::{Error, Result};

/// Plugin for credit image loading.
pub struct CreditImagesPlugin;

impl Plugin for CreditImagesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CreditImages>()
            .add_systems(Update, poll_credit_images)
            .add_systems(PostUpdate, start_credit_image_fetches);
    }
}

/// An image decoded to 8-bit RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Convert into a Bevy image asset.
    pub fn into_bevy_image(self) -> Image {
        Image::new(
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.rgba,
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        )
    }
}

/// A finished fetch, tagged with the slot it was requested for.
struct FetchResult {
    generation: u64,
    index: usize,
    url: String,
    result: Result<DecodedImage>,
}

/// Images loaded for credits, indexed by the sprite numbers in credit text.
#[derive(Resource)]
pub struct CreditImages {
    slots: ImageSlots<Handle<Image>>,
    /// Slots reserved but not yet fetched.
    pending: Vec<usize>,
    /// Bumped on clear so that fetches still in flight are discarded.
    generation: u64,
    http: reqwest::Client,
    result_rx: async_channel::Receiver<FetchResult>,
    result_tx: async_channel::Sender<FetchResult>,
}

impl Default for CreditImages {
    fn default() -> Self {
        let (result_tx, result_rx) = async_channel::unbounded();
        Self {
            slots: ImageSlots::new(),
            pending: Vec::new(),
            generation: 0,
            http: reqwest::Client::new(),
            result_rx,
            result_tx,
        }
    }
}

impl CreditImages {
    /// The loaded image for sprite `index`, if its fetch has completed.
    pub fn image(&self, index: usize) -> Option<&Handle<Image>> {
        self.slots.image(index)
    }

    /// The URL requested for sprite `index`.
    pub fn url(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|slot| slot.url.as_str())
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.loaded_count()
    }
}

impl ImageLoader for CreditImages {
    fn image_count(&self) -> usize {
        self.slots.len()
    }

    fn request_load(&mut self, url: &str) {
        let index = self.slots.reserve(url);
        self.pending.push(index);
    }

    fn clear_loaded_images(&mut self) {
        self.slots.clear();
        self.pending.clear();
        self.generation += 1;
    }
}

/// Start fetches for every slot reserved since the last run.
#[allow(clippy::needless_pass_by_value)]
fn start_credit_image_fetches(mut images: ResMut<CreditImages>, spawner: TaskSpawner) {
    let images = &mut *images;
    for index in images.pending.drain(..) {
        let Some(url) = images.slots.get(index).map(|slot| slot.url.clone()) else {
            continue;
        };

        tracing::debug!("Fetching credit image {index} from {}", abbreviate_url(&url));

        let http = images.http.clone();
        let tx = images.result_tx.clone();
        let generation = images.generation;
        spawner.spawn(async move {
            let result = fetch_image(&http, &url).await;
            let _ = tx
                .send(FetchResult {
                    generation,
                    index,
                    url,
                    result,
                })
                .await;
        });
    }
}

/// Move finished fetches into their slots.
#[allow(clippy::needless_pass_by_value)]
fn poll_credit_images(mut images: ResMut<CreditImages>, mut assets: ResMut<Assets<Image>>) {
    while let Ok(fetch) = images.result_rx.try_recv() {
        if fetch.generation != images.generation {
            continue;
        }

        match fetch.result {
            Ok(decoded) => {
                tracing::debug!(
                    "Loaded credit image {} ({}x{})",
                    fetch.index,
                    decoded.width,
                    decoded.height
                );
                let handle = assets.add(decoded.into_bevy_image());
                images.slots.fill(fetch.index, handle);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load credit image {}: {e}",
                    abbreviate_url(&fetch.url)
                );
            }
        }
    }
}

/// Fetch and decode an image from an HTTP(S) URL or a `data:` URI.
pub async fn fetch_image(http: &reqwest::Client, url: &str) -> Result<DecodedImage> {
    let bytes = if url.starts_with("data:") {
        decode_data_uri(url)?
    } else {
        fetch_bytes(http, url).await?
    };
    decode_image(&bytes)
}

async fn fetch_bytes(http: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = http.get(url).send().await.map_err(|e| Error::Http {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let data = response.bytes().await.map_err(|e| Error::Http {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(data.to_vec())
}

/// Decode the payload of a `data:` URI.
///
/// Base64 payloads are marked with `;base64`; anything else is
/// percent-encoded.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Err(Error::MalformedDataUri {
            detail: "missing data: scheme".to_string(),
        });
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Err(Error::MalformedDataUri {
            detail: "missing ',' before payload".to_string(),
        });
    };

    if header.ends_with(";base64") {
        // Whitespace is common in hand-written markup.
        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        BASE64
            .decode(payload)
            .map_err(|e| Error::MalformedDataUri {
                detail: e.to_string(),
            })
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

/// Decode PNG or JPEG bytes to RGBA.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    Ok(DecodedImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

/// Shorten data URIs for logging.
fn abbreviate_url(url: &str) -> &str {
    if url.starts_with("data:") {
        url.split_once(',').map_or(url, |(header, _)| header)
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 1x1 opaque red PNG.
    const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_base64_data_uri() {
        let uri = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let bytes = decode_data_uri(&uri).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let image = decode_image(&bytes).unwrap();
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.rgba.len(), 4);
    }

    #[test]
    fn test_decode_percent_encoded_data_uri() {
        let bytes = decode_data_uri("data:text/plain,hello%20world").unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn test_malformed_data_uris() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64"),
            Err(Error::MalformedDataUri { .. })
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@@"),
            Err(Error::MalformedDataUri { .. })
        ));
    }

    #[test]
    fn test_decode_garbage_image() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(Error::ImageDecode(_))
        ));
    }

    #[test]
    fn test_reserve_is_synchronous() {
        let mut images = CreditImages::default();
        let first = tiles_credits::reserve_image(&mut images, "https://example.com/a.png");
        let second = tiles_credits::reserve_image(&mut images, "https://example.com/b.png");

        assert_eq!((first, second), (0, 1));
        assert_eq!(images.pending, vec![0, 1]);
        assert_eq!(images.url(1), Some("https://example.com/b.png"));
        assert!(images.image(0).is_none());
    }

    #[test]
    fn test_stale_results_are_dropped() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_resource::<CreditImages>()
            .add_systems(Update, poll_credit_images);

        let send = |app: &mut App, generation: u64| {
            let images = app.world().resource::<CreditImages>();
            images
                .result_tx
                .try_send(FetchResult {
                    generation,
                    index: 0,
                    url: String::new(),
                    result: Ok(DecodedImage {
                        width: 1,
                        height: 1,
                        rgba: vec![255, 0, 0, 255],
                    }),
                })
                .unwrap();
        };

        let mut images = app.world_mut().resource_mut::<CreditImages>();
        images.request_load("https://example.com/stale.png");
        let stale_generation = images.generation;
        images.clear_loaded_images();
        images.request_load("https://example.com/fresh.png");
        let generation = images.generation;

        // The stale fetch targets the same index as the fresh one.
        send(&mut app, stale_generation);
        app.update();
        assert_eq!(app.world().resource::<CreditImages>().loaded_count(), 0);

        send(&mut app, generation);
        app.update();
        let images = app.world().resource::<CreditImages>();
        assert_eq!(images.loaded_count(), 1);
        assert!(images.image(0).is_some());
    }
}
