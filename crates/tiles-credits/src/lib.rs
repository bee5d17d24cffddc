//! Attribution credits for streamed 3D tiles.
//!
//! Data providers attach HTML-like attribution markup to the tiles they serve.
//! This crate turns that markup into the rich-text dialect understood by the
//! engine's text renderer and decides, once per frame, what should be shown.
//!
//! # Design principles
//!
//! - **Engine-agnostic**: the registry, image loader and display are traits;
//!   the engine integration lives elsewhere
//! - **Never fails a frame**: malformed markup is repaired, and fatal markup
//!   produces an empty string instead of an error
//! - **Convert once**: every distinct markup string is parsed at most once
//!
//! # Example
//!
//! ```
//! use tiles_credits::{CreditFrameUpdater, CreditSystem, CreditTexts, ImageSlots};
//!
//! let mut credits = CreditSystem::new();
//! let credit = credits.create_credit("<a href=\"https://example.com\">Example</a>", true);
//! credits.add_credit_to_frame(credit);
//!
//! let mut images: ImageSlots = ImageSlots::new();
//! let mut texts = CreditTexts::default();
//! let mut updater = CreditFrameUpdater::new();
//! updater.update(&mut credits, &mut images, &mut texts);
//!
//! assert_eq!(texts.popup, "<link=\"https://example.com\">Example</link>");
//! ```

mod cache;
mod convert;
mod credit;
mod image;
pub mod markup;
pub mod rich_text;
mod updater;

pub use cache::ConversionCache;
pub use convert::{MarkupConverter, credit_image_name};
pub use credit::{Credit, CreditSource, CreditSystem};
pub use image::{ImageLoader, ImageSlot, ImageSlots, reserve_image};
pub use markup::{Diagnostic, Document, Element, Node, ParsedMarkup, Severity, parse_markup};
pub use rich_text::{RichSpan, rich_text_spans};
pub use updater::{CreditDisplay, CreditFrameUpdater, CreditTexts, DATA_ATTRIBUTION_LINK};
