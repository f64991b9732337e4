use anyhow::Result;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;
use imageproc::point::Point;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, DetectedObject, Thresholds};

/// Label reported for every blob the colour backend keeps.
pub const COLOR_BACKEND_LABEL: &str = "stonka";

/// HSV window of the orange beetle body, on the 0..180 hue scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HsvRange {
    pub hue: (u8, u8),
    pub saturation: (u8, u8),
    pub value: (u8, u8),
}

impl Default for HsvRange {
    fn default() -> Self {
        Self {
            hue: (10, 25),
            saturation: (100, 255),
            value: (100, 255),
        }
    }
}

impl HsvRange {
    fn contains(&self, [h, s, v]: [u8; 3]) -> bool {
        (self.hue.0..=self.hue.1).contains(&h)
            && (self.saturation.0..=self.saturation.1).contains(&s)
            && (self.value.0..=self.value.1).contains(&v)
    }
}

/// Heuristic colour-threshold detector.
///
/// Isolates orange pixels, removes specks with a 5x5 morphological opening and
/// keeps top-level outer contours whose polygon area exceeds `min_area`. Blobs
/// nested inside another blob's hole belong to that blob. Area is the only
/// filter; the box fill ratio is reported as confidence but never drops a blob.
/// Needs no model file, so it is always available as the last fallback.
#[derive(Clone, Debug)]
pub struct ColorBackend {
    range: HsvRange,
    min_area: f64,
}

impl Default for ColorBackend {
    fn default() -> Self {
        Self {
            range: HsvRange::default(),
            min_area: 150.0,
        }
    }
}

impl ColorBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: HsvRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    fn mask(&self, image: &RgbImage) -> GrayImage {
        let mut mask = GrayImage::new(image.width(), image.height());
        for (x, y, pixel) in image.enumerate_pixels() {
            if self.range.contains(rgb_to_hsv(pixel.0)) {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        // radius 2 under the L-inf norm is a 5x5 square kernel
        open(&mask, Norm::LInf, 2)
    }
}

impl DetectorBackend for ColorBackend {
    fn name(&self) -> &'static str {
        "color"
    }

    fn detect(
        &mut self,
        image: &RgbImage,
        _thresholds: Thresholds,
    ) -> Result<Vec<DetectedObject>> {
        let mask = self.mask(image);
        let mut found = Vec::new();

        for contour in find_contours::<i32>(&mask) {
            if contour.border_type != BorderType::Outer || contour.parent.is_some() {
                continue;
            }
            if polygon_area(&contour.points) <= self.min_area {
                continue;
            }
            let Some(bbox) = bounding_rect(&contour.points) else {
                continue;
            };
            let confidence = fill_ratio(&mask, &bbox);
            found.push(DetectedObject::new(COLOR_BACKEND_LABEL, confidence, bbox));
        }

        log::debug!("color backend kept {} blobs", found.len());
        Ok(found)
    }
}

/// RGB to HSV with hue halved to fit a byte (0..180), saturation and value 0..255.
fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / delta).rem_euclid(6.0))
    } else if max == gf {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

    [
        (hue / 2.0).round().min(179.0) as u8,
        saturation.round() as u8,
        max as u8,
    ]
}

fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice as f64 / 2.0).abs()
}

fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    if min_x < 0 || min_y < 0 {
        return None;
    }
    BoundingBox::new(
        min_x as u32,
        min_y as u32,
        max_x as u32 + 1,
        max_y as u32 + 1,
    )
    .ok()
}

fn fill_ratio(mask: &GrayImage, bbox: &BoundingBox) -> f32 {
    let mut filled = 0u64;
    for y in bbox.y1..bbox.y2.min(mask.height()) {
        for x in bbox.x1..bbox.x2.min(mask.width()) {
            if mask.get_pixel(x, y).0[0] > 0 {
                filled += 1;
            }
        }
    }
    (filled as f64 / bbox.area() as f64) as f32
}
