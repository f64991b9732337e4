//! Detector model resolution.
//!
//! Custom-trained weights are preferred. When they are missing or implausibly
//! small (an interrupted export or a git-lfs pointer), the generic pretrained
//! model is used instead and a notice is returned so the caller can warn the
//! user. When no model file is usable at all, the colour-threshold backend
//! keeps the tool working.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::backend::DetectorBackend;
use super::backends::ColorBackend;

/// Weights below this size are treated as broken.
pub const MIN_MODEL_BYTES: u64 = 1024 * 1024;

/// Class order of the generic pretrained fallback model (COCO).
pub const COCO_CLASS_NAMES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelPaths {
    pub custom: PathBuf,
    pub fallback: PathBuf,
}

/// Label lists for the two model files; class indices differ between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelClasses {
    pub custom: Vec<String>,
    pub fallback: Vec<String>,
}

impl ModelClasses {
    /// Labels to decode with for `choice`. Empty for the colour heuristic.
    pub fn for_choice(&self, choice: &ModelChoice) -> &[String] {
        match choice {
            ModelChoice::Custom(_) => &self.custom,
            ModelChoice::Fallback { .. } => &self.fallback,
            ModelChoice::Heuristic { .. } => &[],
        }
    }
}

/// Which model file was picked, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelChoice {
    Custom(PathBuf),
    Fallback { path: PathBuf, reason: String },
    /// No usable model file; detection uses the colour heuristic.
    Heuristic { reason: String },
}

impl ModelChoice {
    /// User-visible warning, if the preferred model was not used.
    pub fn notice(&self) -> Option<String> {
        match self {
            ModelChoice::Custom(_) => None,
            ModelChoice::Fallback { path, reason } => Some(format!(
                "custom beetle model unavailable ({}); using generic model {}",
                reason,
                path.display()
            )),
            ModelChoice::Heuristic { reason } => Some(format!(
                "no detection model available ({}); using colour heuristic",
                reason
            )),
        }
    }
}

/// Decide which model file to load. Never fails: every problem degrades.
pub fn resolve_model(paths: &ModelPaths) -> ModelChoice {
    let custom_problem = match check_weights(&paths.custom) {
        None => return ModelChoice::Custom(paths.custom.clone()),
        Some(problem) => problem,
    };
    match check_weights(&paths.fallback) {
        None => ModelChoice::Fallback {
            path: paths.fallback.clone(),
            reason: custom_problem,
        },
        Some(fallback_problem) => ModelChoice::Heuristic {
            reason: format!("{}; {}", custom_problem, fallback_problem),
        },
    }
}

fn check_weights(path: &Path) -> Option<String> {
    match std::fs::metadata(path) {
        Err(_) => Some(format!("{} not found", path.display())),
        Ok(meta) if !meta.is_file() => Some(format!("{} is not a file", path.display())),
        Ok(meta) if meta.len() < MIN_MODEL_BYTES => Some(format!(
            "{} is only {} bytes",
            path.display(),
            meta.len()
        )),
        Ok(_) => None,
    }
}

/// Load the detector handle for `choice`.
///
/// Called once per process; the returned handle is passed to the pipeline.
/// Without the `backend-tract` feature, model files cannot be executed and
/// the colour backend is returned.
pub fn load_detector(
    choice: &ModelChoice,
    classes: &ModelClasses,
) -> Result<Box<dyn DetectorBackend>> {
    let class_names = classes.for_choice(choice);
    let path = match choice {
        ModelChoice::Custom(path) | ModelChoice::Fallback { path, .. } => path,
        ModelChoice::Heuristic { .. } => return Ok(Box::new(ColorBackend::new())),
    };

    #[cfg(feature = "backend-tract")]
    {
        use super::backends::tract::{TractBackend, DEFAULT_INPUT_SIZE};
        let mut backend = TractBackend::new(path, DEFAULT_INPUT_SIZE, class_names.to_vec())?;
        backend.warm_up()?;
        log::info!("loaded ONNX detector from {}", path.display());
        Ok(Box::new(backend))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        let _ = class_names;
        log::warn!(
            "model {} found but built without backend-tract; using colour heuristic",
            path.display()
        );
        Ok(Box::new(ColorBackend::new()))
    }
}
