//! Stonka Hunter
//!
//! Field helper for Colorado potato beetle ("stonka") scouting. A leaf photo
//! goes through a detector, the boxes are split into beetles and other insects,
//! and the count plus the live temperature drive spray-timing advice.
//!
//! # Module Structure
//!
//! - `detect`: detector backends (colour heuristic, ONNX), model resolution
//! - `classify`: keyword-based partition of detections
//! - `advice`: severity tiers and spray-timing rules
//! - `report`: message composition and the archived image record
//! - `annotate`: box and caption drawing
//! - `weather`: Open-Meteo lookup, normalised to an optional temperature
//! - `storage`: detection archive (`detection_<YYYYMMDD_HHMMSS>.jpg`)
//! - `pipeline`: one submission end to end
//! - `config`: file + environment configuration
//!
//! Only `detect`, `weather` and `storage` perform I/O. Everything between them
//! is pure and safe to call from any number of threads.

pub mod advice;
pub mod annotate;
pub mod classify;
pub mod config;
pub mod detect;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod weather;

pub use advice::{
    advise_severity, advise_spray_timing, advise_treatment, SeverityTier, SprayAdvice,
};
pub use annotate::{draw_detections, load_caption_font};
pub use classify::{classify, ClassificationResult, PestKeywords};
pub use detect::{BoundingBox, DetectedObject, DetectorBackend, Thresholds};
pub use pipeline::{analyze_image, load_photo, Assessment};
pub use report::{build_persisted_record, compose_report, DetectionReport, Headline};
pub use storage::{FilesystemReportStore, HistoryEntry, InMemoryReportStore, ReportStore};
pub use weather::{Coordinates, OpenMeteoClient, WeatherSource};
