//! One photo submission, end to end.
//!
//! Detection and weather lookup happen first, through their collaborators.
//! Everything after that is a pure function of the resolved values.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use serde::Serialize;

use crate::advice::{
    advise_severity, advise_spray_timing, advise_treatment, SeverityTier, SprayAdvice,
};
use crate::annotate::draw_detections;
use crate::classify::{classify, ClassificationResult, PestKeywords};
use crate::detect::{DetectedObject, DetectorBackend, Thresholds};
use crate::report::{compose_report, Headline};

/// Decode a photograph from disk into RGB.
pub fn load_photo(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| format!("open image {}", path.display()))?;
    Ok(image.to_rgb8())
}

/// Outcome of one analysed photo.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assessment {
    pub objects: Vec<DetectedObject>,
    pub classification: ClassificationResult,
    pub temperature_celsius: Option<f64>,
    pub tier: SeverityTier,
    pub spray: SprayAdvice,
    pub headline: Headline,
    pub severity_messages: Vec<String>,
    pub weather_message: String,
    pub messages: Vec<String>,
    /// Product and dose lines; empty for a clean leaf.
    pub treatment: Vec<String>,
}

impl Assessment {
    pub fn from_detections(
        objects: Vec<DetectedObject>,
        temperature_celsius: Option<f64>,
        keywords: &PestKeywords,
    ) -> Self {
        let classification = classify(&objects, keywords);
        let severity_messages = advise_severity(classification.pest_count, temperature_celsius);
        let weather_message = advise_spray_timing(temperature_celsius);
        let messages = compose_report(&classification, &severity_messages, &weather_message);
        let treatment = advise_treatment(classification.pest_count, temperature_celsius);
        Self {
            tier: SeverityTier::from_count(classification.pest_count),
            spray: SprayAdvice::from_temperature(temperature_celsius),
            headline: Headline::from_count(classification.pest_count),
            objects,
            classification,
            temperature_celsius,
            severity_messages,
            weather_message,
            messages,
            treatment,
        }
    }

    pub fn pest_count(&self) -> usize {
        self.classification.pest_count
    }

    /// Copy of `image` with this assessment's boxes drawn on it.
    pub fn annotate(&self, image: &RgbImage, keywords: &PestKeywords) -> RgbImage {
        draw_detections(image, &self.objects, keywords)
    }
}

/// Run the detector on `image` and assess the result.
pub fn analyze_image(
    detector: &mut dyn DetectorBackend,
    image: &RgbImage,
    thresholds: Thresholds,
    temperature_celsius: Option<f64>,
    keywords: &PestKeywords,
) -> Result<Assessment> {
    let objects = detector
        .detect(image, thresholds)
        .with_context(|| format!("{} detector failed", detector.name()))?;
    log::info!(
        "{} detector returned {} objects",
        detector.name(),
        objects.len()
    );
    Ok(Assessment::from_detections(
        objects,
        temperature_celsius,
        keywords,
    ))
}
