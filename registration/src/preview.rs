//! Semi-transparent preview of the registered overlay on the terrain map.

#[cfg(test)]
#[path = "preview_test.rs"]
mod preview_test;

use crate::consts::PREVIEW_OPACITY;
use crate::geometry::GeoBounds;
use crate::registration::RegistrationData;

/// Map operations for image overlays.
pub trait PreviewHost {
    type Layer;

    fn add_overlay(&mut self, bounds: GeoBounds, url: &str, opacity: f64) -> Self::Layer;
    fn remove_overlay(&mut self, layer: Self::Layer);
}

/// Owns at most one preview layer.
pub struct PreviewController<H: PreviewHost> {
    host: H,
    layer: Option<H::Layer>,
}

impl<H: PreviewHost> PreviewController<H> {
    #[must_use]
    pub fn new(host: H) -> Self {
        Self { host, layer: None }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.layer.is_some()
    }

    /// Replace any shown layer with one for `data`'s bounds. Returns `false`
    /// (and shows nothing) without valid bounds or a rendered image.
    pub fn show(&mut self, data: &RegistrationData, url: Option<&str>) -> bool {
        let (Some(bounds), Some(url)) = (data.bounds(), url) else {
            log::warn!("no registration available for preview yet");
            return false;
        };
        self.clear();
        self.layer = Some(self.host.add_overlay(bounds, url, PREVIEW_OPACITY));
        true
    }

    /// Remove the preview layer, if any.
    pub fn clear(&mut self) {
        if let Some(layer) = self.layer.take() {
            self.host.remove_overlay(layer);
        }
    }

    /// Hide if shown, otherwise show. Returns whether a layer is now visible.
    pub fn toggle(&mut self, data: &RegistrationData, url: Option<&str>) -> bool {
        if self.is_visible() {
            self.clear();
            return false;
        }
        self.show(data, url)
    }
}
