//! Sprite sheet image tracking.
//!
//! Entities only ever name their sheet by resource id. The tracker records
//! which ids were asked for and whether the backing file was found, so the
//! renderer can skip sprites whose image is not ready yet without stopping
//! the simulation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Ready { width: u32, height: u32 },
    Failed(String),
}

#[derive(Debug, Default)]
pub struct ResourceTracker {
    root: PathBuf,
    images: BTreeMap<String, ImageState>,
}

impl ResourceTracker {
    /// Image ids resolve relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images: BTreeMap::new(),
        }
    }

    /// Ask for an image. Repeated requests for the same id share one entry.
    /// Returns true when this is the first request.
    pub fn request(&mut self, image: &str) -> bool {
        if self.images.contains_key(image) {
            return false;
        }
        log::debug!("Requested image '{}'", image);
        self.images.insert(image.to_string(), ImageState::Pending);
        true
    }

    pub fn state(&self, image: &str) -> Option<&ImageState> {
        self.images.get(image)
    }

    pub fn is_ready(&self, image: &str) -> bool {
        matches!(self.images.get(image), Some(ImageState::Ready { .. }))
    }

    pub fn mark_ready(&mut self, image: &str, width: u32, height: u32) {
        log::info!("Image '{}' ready ({}x{})", image, width, height);
        self.images
            .insert(image.to_string(), ImageState::Ready { width, height });
    }

    pub fn mark_failed(&mut self, image: &str, reason: String) {
        log::warn!("Image '{}' unavailable: {}", image, reason);
        self.images
            .insert(image.to_string(), ImageState::Failed(reason));
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .filter(|(_, state)| **state == ImageState::Pending)
            .map(|(id, _)| id.as_str())
    }

    /// Probe every pending image on disk, reading only the header.
    /// Returns how many became ready.
    pub fn load_pending(&mut self) -> usize {
        let pending: Vec<String> = self.pending().map(str::to_string).collect();
        let mut loaded = 0;
        for image in pending {
            match probe_dimensions(&self.root.join(&image)) {
                Ok((width, height)) => {
                    self.mark_ready(&image, width, height);
                    loaded += 1;
                }
                Err(reason) => self.mark_failed(&image, reason),
            }
        }
        loaded
    }
}

fn probe_dimensions(path: &Path) -> Result<(u32, u32), String> {
    image::image_dimensions(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
}
