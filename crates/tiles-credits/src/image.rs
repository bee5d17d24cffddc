//! Credit image loading contract.
//!
//! Credits may embed logos. The converter refers to each logo by the index it
//! will have in the loader's image list, so the index must be known before the
//! (asynchronous) load finishes. [`ImageSlots`] makes that ordering explicit:
//! a slot is reserved the moment a load is requested.

/// Something that loads credit images in the background.
pub trait ImageLoader {
    /// Number of images requested so far (and not cleared).
    fn image_count(&self) -> usize;

    /// Start loading the image at `url`. Must not block.
    ///
    /// After this call, [`image_count`](Self::image_count) must have grown by
    /// one, and the new image must take index `image_count() - 1`.
    fn request_load(&mut self, url: &str);

    /// Forget every loaded image.
    fn clear_loaded_images(&mut self);
}

/// Reserve the next image index for `url` and start loading it.
///
/// Returns the number of images that existed before the request, which is the
/// index the new image will have.
pub fn reserve_image<L: ImageLoader + ?Sized>(loader: &mut L, url: &str) -> usize {
    let index = loader.image_count();
    loader.request_load(url);
    index
}

/// A monotonic list of image slots, filled as loads complete.
///
/// `T` is whatever the engine uses to refer to a loaded image.
#[derive(Debug, Clone)]
pub struct ImageSlots<T = ()> {
    slots: Vec<ImageSlot<T>>,
}

/// One requested image.
#[derive(Debug, Clone)]
pub struct ImageSlot<T> {
    /// Where the image is loaded from.
    pub url: String,
    /// The loaded image, once available.
    pub image: Option<T>,
}

impl<T> ImageSlots<T> {
    /// Create an empty slot list.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Append a slot for `url` and return its index.
    pub fn reserve(&mut self, url: &str) -> usize {
        self.slots.push(ImageSlot {
            url: url.to_string(),
            image: None,
        });
        self.slots.len() - 1
    }

    /// Fill the slot at `index` with a loaded image.
    ///
    /// Returns `false` if the slot no longer exists (the list was cleared
    /// while the load was in flight).
    pub fn fill(&mut self, index: usize, image: T) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.image = Some(image);
                true
            }
            None => false,
        }
    }

    /// The slot at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ImageSlot<T>> {
        self.slots.get(index)
    }

    /// The loaded image at `index`, if it has finished loading.
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|slot| slot.image.as_ref())
    }

    /// Number of reserved slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been reserved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots whose image has finished loading.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.image.is_some()).count()
    }

    /// Iterate over all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageSlot<T>> {
        self.slots.iter()
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<T> Default for ImageSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Slots on their own only record requests; nothing is fetched.
impl<T> ImageLoader for ImageSlots<T> {
    fn image_count(&self) -> usize {
        self.len()
    }

    fn request_load(&mut self, url: &str) {
        self.reserve(url);
    }

    fn clear_loaded_images(&mut self) {
        self.clear();
    }
}
