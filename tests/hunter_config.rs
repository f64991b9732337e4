use std::sync::Mutex;

use tempfile::{Builder, NamedTempFile};

use stonka_hunter::config::HunterConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "STONKA_CONFIG",
        "STONKA_HISTORY_DIR",
        "STONKA_CITY",
        "STONKA_WEATHER_URL",
        "STONKA_WEATHER_TIMEOUT_SECS",
        "STONKA_MODEL_PATH",
        "STONKA_FALLBACK_MODEL_PATH",
        "STONKA_FONT_PATH",
        "STONKA_CONFIDENCE",
        "STONKA_IOU",
        "STONKA_PEST_KEYWORDS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = HunterConfig::load().expect("load defaults");
    assert_eq!(cfg.history_dir.to_str(), Some("detections"));
    assert_eq!(cfg.city, "Warszawa");
    assert_eq!(cfg.pest_keywords, vec!["beetle", "stonka"]);
    assert_eq!(cfg.thresholds.confidence, 0.20);
    assert_eq!(cfg.weather.timeout.as_secs(), 5);
    assert_eq!(cfg.weather.url, "https://api.open-meteo.com/v1/forecast");
    assert!(cfg.font_path.is_none());
    assert_eq!(cfg.model.class_names, vec!["stonka"]);
    assert_eq!(cfg.model.fallback_class_names.len(), 80);
    assert_eq!(cfg.model.fallback_class_names[0], "person");
}

#[test]
fn loads_json_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "history_dir": "/var/lib/stonka/detections",
        "city": "krakÓw",
        "pest_keywords": ["Beetle"],
        "weather": { "url": "http://127.0.0.1:9/forecast", "timeout_secs": 2 },
        "model": {
            "path": "weights/best.onnx",
            "fallback_path": "weights/yolov8n.onnx",
            "class_names": ["stonka", "ladybird"],
            "fallback_class_names": ["person", "insect"]
        },
        "thresholds": { "confidence": 0.1, "iou": 0.5 }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("STONKA_CONFIG", file.path());
    std::env::set_var("STONKA_CITY", "Lublin");
    std::env::set_var("STONKA_PEST_KEYWORDS", "beetle, stonka ,larva");
    std::env::set_var("STONKA_CONFIDENCE", "0.35");

    let cfg = HunterConfig::load().expect("load config");

    assert_eq!(cfg.history_dir.to_str(), Some("/var/lib/stonka/detections"));
    assert_eq!(cfg.city, "Lublin");
    assert_eq!(cfg.pest_keywords, vec!["beetle", "larva", "stonka"]);
    assert_eq!(cfg.weather.url, "http://127.0.0.1:9/forecast");
    assert_eq!(cfg.weather.timeout.as_secs(), 2);
    assert_eq!(cfg.model.path.to_str(), Some("weights/best.onnx"));
    assert_eq!(cfg.model.class_names, vec!["stonka", "ladybird"]);
    assert_eq!(cfg.model.classes().fallback, vec!["person", "insect"]);
    assert_eq!(cfg.thresholds.confidence, 0.35);
    assert_eq!(cfg.thresholds.iou, 0.5);

    clear_env();
}

#[test]
fn loads_toml_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp toml config");
    let toml = r#"
        city = "Poznań"
        font_path = "/usr/share/fonts/caption.ttf"

        [thresholds]
        confidence = 0.25
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");
    std::env::set_var("STONKA_CONFIG", file.path());

    let cfg = HunterConfig::load().expect("load toml config");
    assert_eq!(cfg.city, "Poznań");
    assert_eq!(cfg.thresholds.confidence, 0.25);
    assert_eq!(cfg.thresholds.iou, 0.45);
    assert_eq!(
        cfg.font_path.as_deref().and_then(|p| p.to_str()),
        Some("/usr/share/fonts/caption.ttf")
    );

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("STONKA_CONFIDENCE", "1.7");
    assert!(HunterConfig::load().is_err());
    clear_env();

    std::env::set_var("STONKA_CITY", "Atlantis");
    assert!(HunterConfig::load().is_err());
    clear_env();

    std::env::set_var("STONKA_WEATHER_TIMEOUT_SECS", "soon");
    assert!(HunterConfig::load().is_err());
    clear_env();

    std::env::set_var("STONKA_WEATHER_TIMEOUT_SECS", "0");
    assert!(HunterConfig::load().is_err());
    clear_env();
}
