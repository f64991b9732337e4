mod backend;
pub mod backends;
pub mod model;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::{ColorBackend, StubBackend};
pub use model::{
    load_detector, resolve_model, ModelChoice, ModelClasses, ModelPaths, COCO_CLASS_NAMES,
    MIN_MODEL_BYTES,
};
pub use registry::BackendRegistry;
pub use result::{
    non_max_suppression, BoundingBox, DetectedObject, Thresholds, DEFAULT_CONFIDENCE_THRESHOLD,
    DEFAULT_IOU_THRESHOLD,
};
