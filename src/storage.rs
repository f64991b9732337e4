//! Detection archive.
//!
//! Reports are stored as image files named `detection_<YYYYMMDD_HHMMSS>.<ext>`
//! in one directory. Because the timestamp is fixed-width, sorting names in
//! reverse gives newest first.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use regex::Regex;

use crate::report::DetectionReport;

pub const DEFAULT_HISTORY_DIR: &str = "detections";
pub const FILE_PREFIX: &str = "detection_";
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const UNKNOWN_TIME_LABEL: &str = "Unknown time";
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const JPEG_QUALITY: u8 = 90;

/// Archive file name for a report timestamp.
pub fn file_name_for(timestamp: &NaiveDateTime) -> String {
    format!("{}{}.jpg", FILE_PREFIX, timestamp.format(FILE_TIMESTAMP_FORMAT))
}

fn file_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^detection_(\d{8}_\d{6})\.[A-Za-z]+$").unwrap())
}

/// Decode the capture time from an archive file name, if it follows the convention.
pub fn parse_file_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let caps = file_name_pattern().captures(file_name)?;
    NaiveDateTime::parse_from_str(&caps[1], FILE_TIMESTAMP_FORMAT).ok()
}

fn is_archive_image(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// One archived image as shown in the history listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub file_name: String,
    pub captured_at: Option<NaiveDateTime>,
}

impl HistoryEntry {
    pub fn from_file_name(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let captured_at = parse_file_timestamp(&file_name);
        Self {
            file_name,
            captured_at,
        }
    }

    /// `"2025-03-15 12:00"`, or `"Unknown time"` for names off the convention.
    pub fn label(&self) -> String {
        match &self.captured_at {
            Some(ts) => ts.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
            None => UNKNOWN_TIME_LABEL.to_string(),
        }
    }
}

fn sort_newest_first(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| b.file_name.cmp(&a.file_name));
}

/// Storage collaborator for detection reports.
pub trait ReportStore {
    /// Persist a report; returns the file name it was stored under.
    fn save(&mut self, report: &DetectionReport) -> Result<String>;

    /// Archived images, newest first.
    fn list(&self) -> Result<Vec<HistoryEntry>>;

    /// Remove one archived image by file name.
    fn delete(&mut self, file_name: &str) -> Result<()>;
}

fn validate_file_name(file_name: &str) -> Result<()> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("file name cannot be empty"));
    }
    if trimmed != file_name
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
    {
        return Err(anyhow!("invalid archive file name '{}'", file_name));
    }
    if !is_archive_image(file_name) {
        return Err(anyhow!("'{}' is not an archived detection image", file_name));
    }
    Ok(())
}

/// Filesystem-backed archive rooted at one directory.
pub struct FilesystemReportStore {
    root: PathBuf,
}

impl FilesystemReportStore {
    /// The directory is created lazily on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}

impl ReportStore for FilesystemReportStore {
    fn save(&mut self, report: &DetectionReport) -> Result<String> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create archive directory {}", self.root.display()))?;
        let file_name = file_name_for(&report.timestamp);
        let path = self.path_of(&file_name);
        if path.exists() {
            return Err(anyhow!("archive entry {} already exists", file_name));
        }
        let encoded = encode_jpeg(&report.image)?;
        write_new_atomic(&path, &encoded)?;
        log::info!(
            "saved detection {} (beetles={}, temperature={:?})",
            path.display(),
            report.pest_count,
            report.temperature_celsius
        );
        Ok(file_name)
    }

    fn list(&self) -> Result<Vec<HistoryEntry>> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(anyhow!(
                    "failed to read archive directory {}: {}",
                    self.root.display(),
                    e
                ))
            }
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.context("read archive directory entry")?;
            let Ok(file_name) = dir_entry.file_name().into_string() else {
                continue;
            };
            if !is_archive_image(&file_name) {
                continue;
            }
            if !dir_entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            entries.push(HistoryEntry::from_file_name(file_name));
        }
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    fn delete(&mut self, file_name: &str) -> Result<()> {
        validate_file_name(file_name)?;
        let path = self.path_of(file_name);
        fs::remove_file(&path).with_context(|| format!("delete {}", path.display()))?;
        log::info!("deleted detection {}", path.display());
        Ok(())
    }
}

fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(image)
        .context("encode detection jpeg")?;
    Ok(out)
}

/// Write `bytes` to `path` through a synced temp file, never replacing an
/// existing file. The temp file is removed on every path.
fn write_new_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = temp_path_for(path);
    let result = write_synced(&tmp_path, bytes).and_then(|()| {
        fs::hard_link(&tmp_path, path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                anyhow!("archive entry {} already exists", path.display())
            } else {
                anyhow!("link into {}: {}", path.display(), e)
            }
        })
    });
    let _ = fs::remove_file(&tmp_path);
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension(format!("{}.tmp", std::process::id()))
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("create {}", path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("write {}", path.display()))?;
    file.sync_all()
        .with_context(|| format!("sync {}", path.display()))?;
    Ok(())
}

/// In-memory archive for tests and dry runs. Keeps encoded bytes per file name.
#[derive(Clone, Debug, Default)]
pub struct InMemoryReportStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self, file_name: &str) -> Option<&[u8]> {
        self.files.get(file_name).map(|b| b.as_slice())
    }
}

impl ReportStore for InMemoryReportStore {
    fn save(&mut self, report: &DetectionReport) -> Result<String> {
        let file_name = file_name_for(&report.timestamp);
        if self.files.contains_key(&file_name) {
            return Err(anyhow!("archive entry {} already exists", file_name));
        }
        self.files.insert(file_name.clone(), encode_jpeg(&report.image)?);
        Ok(file_name)
    }

    fn list(&self) -> Result<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self
            .files
            .keys()
            .map(|name| HistoryEntry::from_file_name(name.clone()))
            .collect();
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    fn delete(&mut self, file_name: &str) -> Result<()> {
        validate_file_name(file_name)?;
        self.files
            .remove(file_name)
            .map(|_| ())
            .ok_or_else(|| anyhow!("no archive entry named {}", file_name))
    }
}
