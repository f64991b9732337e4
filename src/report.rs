//! Report composition.
//!
//! `compose_report` orders the text shown to the user; `build_persisted_record`
//! prepares the archive artifact. Neither performs I/O.

use ab_glyph::{FontArc, PxScale};
use chrono::NaiveDateTime;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use serde::Serialize;

use crate::classify::ClassificationResult;

/// Counts at or above this get the celebratory "big catch" cue.
pub const CELEBRATE_MIN_COUNT: usize = 5;

const CAPTION_BANNER_HEIGHT: u32 = 32;
const CAPTION_TEXT_SCALE: f32 = 22.0;
const CAPTION_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const CAPTION_FOREGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// First line of every report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Headline {
    Alert { pest_count: usize },
    Clear,
}

impl Headline {
    pub fn from_count(pest_count: usize) -> Self {
        if pest_count > 0 {
            Headline::Alert { pest_count }
        } else {
            Headline::Clear
        }
    }

    /// Whether the presentation layer should play its celebratory cue.
    pub fn celebrate(&self) -> bool {
        matches!(self, Headline::Alert { pest_count } if *pest_count >= CELEBRATE_MIN_COUNT)
    }

    pub fn message(&self) -> String {
        match self {
            Headline::Alert { pest_count } => format!(
                "ALERT: {} Colorado potato beetle{} detected!",
                pest_count,
                if *pest_count == 1 { "" } else { "s" }
            ),
            Headline::Clear => {
                "No Colorado potato beetles detected. The leaf looks clean.".to_string()
            }
        }
    }
}

fn other_species_summary(classification: &ClassificationResult) -> Option<String> {
    if classification.other_counts.is_empty() {
        return None;
    }
    let parts: Vec<String> = classification
        .other_counts
        .iter()
        .map(|(label, count)| format!("{} x{}", label, count))
        .collect();
    Some(format!("Other insects detected: {}", parts.join(", ")))
}

/// Headline, other-species summary (when any), severity messages, weather message.
pub fn compose_report(
    classification: &ClassificationResult,
    severity_messages: &[String],
    weather_message: &str,
) -> Vec<String> {
    let mut out = Vec::with_capacity(severity_messages.len() + 3);
    out.push(Headline::from_count(classification.pest_count).message());
    if let Some(summary) = other_species_summary(classification) {
        out.push(summary);
    }
    out.extend(severity_messages.iter().cloned());
    out.push(weather_message.to_string());
    out
}

/// Archive artifact: an annotated image with the summary caption burned in.
#[derive(Clone, Debug)]
pub struct DetectionReport {
    pub timestamp: NaiveDateTime,
    pub pest_count: usize,
    pub temperature_celsius: Option<f64>,
    pub caption: String,
    pub image: RgbImage,
}

/// One-line summary burned into saved images.
pub fn caption_text(pest_count: usize, temperature_celsius: Option<f64>) -> String {
    let temperature = match temperature_celsius {
        Some(t) => format!("{:.1}°C", t),
        None => "n/a".to_string(),
    };
    format!("Beetles: {} | Temp: {}", pest_count, temperature)
}

/// Build the record handed to the storage collaborator.
///
/// The caption sits on a dark banner along the bottom edge. Without a font the
/// banner is still painted so every archived image has the same layout.
pub fn build_persisted_record(
    image: &RgbImage,
    pest_count: usize,
    temperature_celsius: Option<f64>,
    timestamp: NaiveDateTime,
    font: Option<&FontArc>,
) -> DetectionReport {
    let caption = caption_text(pest_count, temperature_celsius);
    let mut canvas = image.clone();

    let (width, height) = canvas.dimensions();
    if width > 0 && height > 0 {
        let banner = CAPTION_BANNER_HEIGHT.min(height);
        let top = height - banner;
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(0, top as i32).of_size(width, banner),
            CAPTION_BACKGROUND,
        );
        if let Some(font) = font {
            draw_text_mut(
                &mut canvas,
                CAPTION_FOREGROUND,
                6,
                top as i32 + 4,
                PxScale::from(CAPTION_TEXT_SCALE),
                font,
                &caption,
            );
        }
    }

    DetectionReport {
        timestamp,
        pest_count,
        temperature_celsius,
        caption,
        image: canvas,
    }
}
