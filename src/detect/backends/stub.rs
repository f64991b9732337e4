use anyhow::Result;
use image::RgbImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{DetectedObject, Thresholds};

/// Stub backend for testing. Returns a fixed set of detections for every image.
pub struct StubBackend {
    detections: Vec<DetectedObject>,
}

impl StubBackend {
    pub fn new(detections: Vec<DetectedObject>) -> Self {
        Self { detections }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _image: &RgbImage, thresholds: Thresholds) -> Result<Vec<DetectedObject>> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= thresholds.confidence)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    #[test]
    fn stub_applies_confidence_threshold() {
        let bbox = BoundingBox::new(1, 1, 5, 5).unwrap();
        let mut backend = StubBackend::new(vec![
            DetectedObject::new("Beetle", 0.9, bbox),
            DetectedObject::new("Beetle", 0.1, bbox),
        ]);
        let found = backend
            .detect(&RgbImage::new(8, 8), Thresholds::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].confidence, 0.9);
    }
}
