use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates. `x1 < x2` and `y1 < y2` always hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self> {
        if x1 >= x2 || y1 >= y2 {
            return Err(anyhow!(
                "degenerate bounding box ({}, {}) - ({}, {})",
                x1,
                y1,
                x2,
                y2
            ));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    fn intersection(&self, other: &BoundingBox) -> u64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        if x1 >= x2 || y1 >= y2 {
            return 0;
        }
        (x2 - x1) as u64 * (y2 - y1) as u64
    }

    /// Intersection over union, in [0, 1].
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection(other);
        let union = self.area() + other.area() - inter;
        if union == 0 {
            return 0.0;
        }
        inter as f32 / union as f32
    }
}

/// One labelled box returned by a detector backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            bbox,
        }
    }
}

/// Detector score cut-offs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// Minimum score for a box to be reported.
    pub confidence: f32,
    /// Overlap above which the weaker of two same-label boxes is suppressed.
    pub iou: f32,
}

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.20;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE_THRESHOLD,
            iou: DEFAULT_IOU_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(anyhow!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence
            ));
        }
        if !(0.0..=1.0).contains(&self.iou) {
            return Err(anyhow!(
                "iou threshold must be within [0, 1], got {}",
                self.iou
            ));
        }
        Ok(())
    }
}

/// Greedy per-label non-maximum suppression. Keeps the strongest box of every
/// overlapping cluster; output is ordered by descending confidence.
pub fn non_max_suppression(mut objects: Vec<DetectedObject>, iou: f32) -> Vec<DetectedObject> {
    objects.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<DetectedObject> = Vec::with_capacity(objects.len());
    for candidate in objects {
        let suppressed = kept
            .iter()
            .any(|k| k.label == candidate.label && k.bbox.iou(&candidate.bbox) > iou);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x1: u32, y1: u32, x2: u32, y2: u32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2).unwrap()
    }

    #[test]
    fn rejects_degenerate_boxes() {
        assert!(BoundingBox::new(10, 10, 10, 20).is_err());
        assert!(BoundingBox::new(10, 20, 30, 5).is_err());
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = bbox(0, 0, 10, 10);
        assert_eq!(a.iou(&a), 1.0);
        assert_eq!(a.iou(&bbox(20, 20, 30, 30)), 0.0);
        // 5x10 overlap over 150 union
        let half = a.iou(&bbox(5, 0, 15, 10));
        assert!((half - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn nms_keeps_strongest_per_label() {
        let objects = vec![
            DetectedObject::new("beetle", 0.6, bbox(0, 0, 10, 10)),
            DetectedObject::new("beetle", 0.9, bbox(1, 1, 11, 11)),
            DetectedObject::new("ladybird", 0.5, bbox(1, 1, 11, 11)),
            DetectedObject::new("beetle", 0.4, bbox(50, 50, 60, 60)),
        ];
        let kept = non_max_suppression(objects, 0.45);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].confidence, 0.9);
        assert!(kept.iter().any(|o| o.label == "ladybird"));
    }

    #[test]
    fn threshold_validation() {
        assert!(Thresholds::default().validate().is_ok());
        let bad = Thresholds {
            confidence: 1.5,
            iou: 0.4,
        };
        assert!(bad.validate().is_err());
    }
}
