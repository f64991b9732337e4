use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use image::{Rgb, RgbImage};
use tempfile::tempdir;

use stonka_hunter::report::build_persisted_record;
use stonka_hunter::storage::{
    FilesystemReportStore, InMemoryReportStore, ReportStore, UNKNOWN_TIME_LABEL,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn leaf() -> RgbImage {
    RgbImage::from_pixel(48, 48, Rgb([40, 140, 40]))
}

#[test]
fn lists_newest_first_with_decoded_times() -> Result<()> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("detection_20250101_090000.jpg"), b"jpg")?;
    std::fs::write(dir.path().join("detection_20250315_120000.jpg"), b"jpg")?;
    std::fs::write(dir.path().join("notes.txt"), b"not an image")?;

    let store = FilesystemReportStore::new(dir.path());
    let entries = store.list()?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].file_name, "detection_20250315_120000.jpg");
    assert_eq!(entries[0].label(), "2025-03-15 12:00");
    assert_eq!(entries[1].file_name, "detection_20250101_090000.jpg");
    assert_eq!(entries[1].label(), "2025-01-01 09:00");
    Ok(())
}

#[test]
fn malformed_image_names_degrade_to_unknown_time() -> Result<()> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("IMG_0042.JPG"), b"jpg")?;
    std::fs::write(dir.path().join("detection_20250601_080000.png"), b"png")?;

    let entries = FilesystemReportStore::new(dir.path()).list()?;
    assert_eq!(entries.len(), 2);
    let unknown = entries
        .iter()
        .find(|e| e.file_name == "IMG_0042.JPG")
        .expect("listed");
    assert_eq!(unknown.label(), UNKNOWN_TIME_LABEL);
    Ok(())
}

#[test]
fn missing_directory_lists_empty() -> Result<()> {
    let dir = tempdir()?;
    let store = FilesystemReportStore::new(dir.path().join("never_created"));
    assert!(store.list()?.is_empty());
    Ok(())
}

#[test]
fn save_then_delete_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let mut store = FilesystemReportStore::new(dir.path().join("detections"));

    let record = build_persisted_record(&leaf(), 3, Some(18.0), at(2025, 6, 1, 7, 30, 5), None);
    let file_name = store.save(&record)?;
    assert_eq!(file_name, "detection_20250601_073005.jpg");

    let saved = image::open(store.path_of(&file_name))?.to_rgb8();
    assert_eq!(saved.dimensions(), (48, 48));

    // same second collides
    assert!(store.save(&record).is_err());

    let listed = store.list()?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].label(), "2025-06-01 07:30");

    store.delete(&file_name)?;
    assert!(store.list()?.is_empty());
    assert!(store.delete(&file_name).is_err());
    Ok(())
}

#[test]
fn delete_refuses_paths_outside_archive() -> Result<()> {
    let dir = tempdir()?;
    let outside = dir.path().join("keep.jpg");
    std::fs::write(&outside, b"jpg")?;
    let mut store = FilesystemReportStore::new(dir.path().join("detections"));

    assert!(store.delete("../keep.jpg").is_err());
    assert!(outside.exists());
    Ok(())
}

#[test]
fn in_memory_store_matches_filesystem_ordering() -> Result<()> {
    let mut store = InMemoryReportStore::new();
    for ts in [at(2025, 1, 1, 9, 0, 0), at(2025, 3, 15, 12, 0, 0)] {
        let record = build_persisted_record(&leaf(), 0, None, ts, None);
        store.save(&record)?;
    }
    let entries = store.list()?;
    assert_eq!(entries[0].label(), "2025-03-15 12:00");
    assert_eq!(entries[1].label(), "2025-01-01 09:00");
    assert!(store.bytes(&entries[0].file_name).is_some());

    store.delete(&entries[1].file_name)?;
    assert_eq!(store.list()?.len(), 1);
    Ok(())
}
