use anyhow::Result;
use image::RgbImage;

use crate::detect::result::{DetectedObject, Thresholds};

/// Detector backend trait.
///
/// A backend turns one RGB photograph into labelled boxes. It must not keep
/// the image beyond the `detect` call and must not write to disk or reach the
/// network; everything after detection is handled by pure code.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on an image.
    ///
    /// Boxes scoring below `thresholds.confidence` are not returned.
    fn detect(&mut self, image: &RgbImage, thresholds: Thresholds) -> Result<Vec<DetectedObject>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
