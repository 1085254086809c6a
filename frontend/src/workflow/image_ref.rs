use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use gloo_file::{Blob, ObjectUrl};

use super::WorkflowError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        static ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

/// A user-selected file as read from the picker, camera or clipboard.
#[derive(Clone, Debug)]
pub struct ImagePayload {
    file_name: String,
    media_type: String,
    bytes: Rc<[u8]>,
}

impl ImagePayload {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Rc<[u8]>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The active image: the bytes kept for submission plus a revocable display URL.
#[derive(Clone, Debug)]
pub struct ImageHandle {
    id: ImageId,
    payload: ImagePayload,
    display_url: Rc<str>,
}

impl ImageHandle {
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }

    pub fn display_url(&self) -> &str {
        &self.display_url
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Source of the short-lived URLs used to show a selected image.
pub trait PreviewAllocator {
    fn allocate(&self, payload: &ImagePayload) -> String;
    fn revoke(&self, url: &str);
}

/// Blob object URLs. Dropping an `ObjectUrl` revokes it.
#[derive(Default)]
pub struct ObjectUrlAllocator {
    live: RefCell<HashMap<String, ObjectUrl>>,
}

impl PreviewAllocator for ObjectUrlAllocator {
    fn allocate(&self, payload: &ImagePayload) -> String {
        let blob = Blob::new_with_options(payload.bytes(), Some(payload.media_type()));
        let object_url = ObjectUrl::from(blob);
        let url = object_url.to_string();
        self.live.borrow_mut().insert(url.clone(), object_url);
        url
    }

    fn revoke(&self, url: &str) {
        self.live.borrow_mut().remove(url);
    }
}

pub struct ImageRefManager {
    allocator: Rc<dyn PreviewAllocator>,
    live: RefCell<HashSet<ImageId>>,
}

impl ImageRefManager {
    pub fn new(allocator: Rc<dyn PreviewAllocator>) -> Self {
        Self {
            allocator,
            live: RefCell::new(HashSet::new()),
        }
    }

    pub fn is_image(payload: &ImagePayload) -> bool {
        payload
            .media_type()
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    pub fn select(&self, payload: ImagePayload) -> Result<ImageHandle, WorkflowError> {
        if !Self::is_image(&payload) {
            log::warn!(
                "Skipping non-image file: {} ({})",
                payload.file_name(),
                payload.media_type()
            );
            return Err(WorkflowError::InvalidMediaType(payload.media_type().to_string()));
        }

        let id = ImageId::next();
        let display_url: Rc<str> = self.allocator.allocate(&payload).into();
        self.live.borrow_mut().insert(id);

        Ok(ImageHandle {
            id,
            payload,
            display_url,
        })
    }

    /// Revokes the handle's display URL. Unknown or already released handles are ignored.
    pub fn release(&self, handle: &ImageHandle) {
        if self.live.borrow_mut().remove(&handle.id) {
            self.allocator.revoke(handle.display_url());
            log::debug!("Released preview for {}", handle.payload.file_name());
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }
}
