//! Drawing detection boxes onto photographs.

use std::path::Path;

use ab_glyph::FontArc;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::classify::PestKeywords;
use crate::detect::{BoundingBox, DetectedObject};

pub const PEST_BORDER_COLOR: Rgb<u8> = Rgb([220, 30, 30]);
pub const OTHER_BORDER_COLOR: Rgb<u8> = Rgb([30, 90, 220]);
pub const BORDER_WIDTH: u32 = 3;

/// Fonts tried when no caption font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Return a copy of `image` with a box around every detection. Pests are red,
/// other species blue.
pub fn draw_detections(
    image: &RgbImage,
    objects: &[DetectedObject],
    keywords: &PestKeywords,
) -> RgbImage {
    let mut out = image.clone();
    for object in objects {
        let color = if keywords.is_pest(&object.label) {
            PEST_BORDER_COLOR
        } else {
            OTHER_BORDER_COLOR
        };
        draw_thick_box(&mut out, &object.bbox, color);
    }
    out
}

fn draw_thick_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    for i in 0..BORDER_WIDTH {
        let w = bbox.width().saturating_sub(2 * i);
        let h = bbox.height().saturating_sub(2 * i);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((bbox.x1 + i) as i32, (bbox.y1 + i) as i32).of_size(w, h);
        draw_hollow_rect_mut(image, rect, color);
    }
}

/// Load the caption font. Falls back to common system fonts; `None` when no
/// font can be read, in which case captions are painted without text.
pub fn load_caption_font(configured: Option<&Path>) -> Option<FontArc> {
    let candidates = configured
        .into_iter()
        .map(Path::to_path_buf)
        .chain(SYSTEM_FONT_CANDIDATES.iter().map(|p| Path::new(p).to_path_buf()));
    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                log::debug!("caption font loaded from {}", path.display());
                return Some(font);
            }
            Err(e) => log::warn!("ignoring unreadable font {}: {}", path.display(), e),
        }
    }
    log::warn!("no caption font available; saved images will carry a blank caption banner");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_are_colored_by_category() {
        let image = RgbImage::from_pixel(40, 40, Rgb([0, 128, 0]));
        let objects = vec![
            DetectedObject::new("Beetle", 0.9, BoundingBox::new(2, 2, 15, 15).unwrap()),
            DetectedObject::new("Ladybird", 0.9, BoundingBox::new(20, 20, 35, 35).unwrap()),
        ];
        let out = draw_detections(&image, &objects, &PestKeywords::default());

        assert_eq!(*out.get_pixel(2, 2), PEST_BORDER_COLOR);
        assert_eq!(*out.get_pixel(20, 20), OTHER_BORDER_COLOR);
        assert_eq!(*out.get_pixel(8, 8), Rgb([0, 128, 0]));
        // source untouched
        assert_eq!(*image.get_pixel(2, 2), Rgb([0, 128, 0]));
    }

    #[test]
    fn tiny_boxes_do_not_panic() {
        let image = RgbImage::new(10, 10);
        let objects = vec![DetectedObject::new(
            "Beetle",
            0.5,
            BoundingBox::new(9, 9, 10, 10).unwrap(),
        )];
        let out = draw_detections(&image, &objects, &PestKeywords::default());
        assert_eq!(*out.get_pixel(9, 9), PEST_BORDER_COLOR);
    }
}
