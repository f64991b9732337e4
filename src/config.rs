use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classify::{PestKeywords, DEFAULT_PEST_KEYWORDS};
use crate::detect::{
    ModelClasses, ModelPaths, Thresholds, COCO_CLASS_NAMES, DEFAULT_CONFIDENCE_THRESHOLD,
    DEFAULT_IOU_THRESHOLD,
};
use crate::storage::DEFAULT_HISTORY_DIR;
use crate::weather::{city_coordinates, DEFAULT_WEATHER_TIMEOUT, DEFAULT_WEATHER_URL};

const DEFAULT_CITY: &str = "Warszawa";
const DEFAULT_MODEL_PATH: &str = "models/stonka.onnx";
const DEFAULT_FALLBACK_MODEL_PATH: &str = "models/yolov8n.onnx";

#[derive(Debug, Deserialize, Default)]
struct HunterConfigFile {
    history_dir: Option<PathBuf>,
    city: Option<String>,
    pest_keywords: Option<Vec<String>>,
    font_path: Option<PathBuf>,
    weather: Option<WeatherConfigFile>,
    model: Option<ModelConfigFile>,
    thresholds: Option<ThresholdsConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct WeatherConfigFile {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    fallback_path: Option<PathBuf>,
    class_names: Option<Vec<String>>,
    fallback_class_names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct ThresholdsConfigFile {
    confidence: Option<f32>,
    iou: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct HunterConfig {
    pub history_dir: PathBuf,
    pub city: String,
    pub pest_keywords: Vec<String>,
    pub font_path: Option<PathBuf>,
    pub weather: WeatherSettings,
    pub model: ModelSettings,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub path: PathBuf,
    pub fallback_path: PathBuf,
    pub class_names: Vec<String>,
    pub fallback_class_names: Vec<String>,
}

impl ModelSettings {
    pub fn paths(&self) -> ModelPaths {
        ModelPaths {
            custom: self.path.clone(),
            fallback: self.fallback_path.clone(),
        }
    }

    pub fn classes(&self) -> ModelClasses {
        ModelClasses {
            custom: self.class_names.clone(),
            fallback: self.fallback_class_names.clone(),
        }
    }
}

impl HunterConfig {
    /// Defaults, then the file named by `STONKA_CONFIG`, then `STONKA_*` env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("STONKA_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: HunterConfigFile) -> Self {
        let weather = WeatherSettings {
            url: file
                .weather
                .as_ref()
                .and_then(|weather| weather.url.clone())
                .unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string()),
            timeout: file
                .weather
                .as_ref()
                .and_then(|weather| weather.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_WEATHER_TIMEOUT),
        };
        let model = ModelSettings {
            path: file
                .model
                .as_ref()
                .and_then(|model| model.path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            fallback_path: file
                .model
                .as_ref()
                .and_then(|model| model.fallback_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FALLBACK_MODEL_PATH)),
            class_names: file
                .model
                .as_ref()
                .and_then(|model| model.class_names.clone())
                .unwrap_or_else(|| vec!["stonka".to_string()]),
            fallback_class_names: file
                .model
                .and_then(|model| model.fallback_class_names)
                .unwrap_or_else(|| COCO_CLASS_NAMES.iter().map(|c| c.to_string()).collect()),
        };
        let thresholds = Thresholds {
            confidence: file
                .thresholds
                .as_ref()
                .and_then(|t| t.confidence)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            iou: file
                .thresholds
                .as_ref()
                .and_then(|t| t.iou)
                .unwrap_or(DEFAULT_IOU_THRESHOLD),
        };
        Self {
            history_dir: file
                .history_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_DIR)),
            city: file.city.unwrap_or_else(|| DEFAULT_CITY.to_string()),
            pest_keywords: file.pest_keywords.unwrap_or_else(|| {
                DEFAULT_PEST_KEYWORDS.iter().map(|k| k.to_string()).collect()
            }),
            font_path: file.font_path,
            weather,
            model,
            thresholds,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(dir) = non_empty_env("STONKA_HISTORY_DIR") {
            self.history_dir = PathBuf::from(dir);
        }
        if let Some(city) = non_empty_env("STONKA_CITY") {
            self.city = city;
        }
        if let Some(url) = non_empty_env("STONKA_WEATHER_URL") {
            self.weather.url = url;
        }
        if let Some(timeout) = non_empty_env("STONKA_WEATHER_TIMEOUT_SECS") {
            let seconds: u64 = timeout.parse().map_err(|_| {
                anyhow!("STONKA_WEATHER_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.weather.timeout = Duration::from_secs(seconds);
        }
        if let Some(path) = non_empty_env("STONKA_MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }
        if let Some(path) = non_empty_env("STONKA_FALLBACK_MODEL_PATH") {
            self.model.fallback_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty_env("STONKA_FONT_PATH") {
            self.font_path = Some(PathBuf::from(path));
        }
        if let Some(confidence) = non_empty_env("STONKA_CONFIDENCE") {
            self.thresholds.confidence = confidence
                .parse()
                .map_err(|_| anyhow!("STONKA_CONFIDENCE must be a number"))?;
        }
        if let Some(iou) = non_empty_env("STONKA_IOU") {
            self.thresholds.iou = iou
                .parse()
                .map_err(|_| anyhow!("STONKA_IOU must be a number"))?;
        }
        if let Some(keywords) = non_empty_env("STONKA_PEST_KEYWORDS") {
            let parsed = split_csv(&keywords);
            if !parsed.is_empty() {
                self.pest_keywords = parsed;
            }
        }
        Ok(())
    }

    /// Re-check invariants; call again after applying CLI overrides.
    pub fn validate(&mut self) -> Result<()> {
        self.thresholds.validate()?;
        let keywords = self.keywords()?;
        self.pest_keywords = keywords.keywords().to_vec();

        match city_coordinates(&self.city) {
            Some(location) => self.city = location.name,
            None => return Err(anyhow!("unknown default city '{}'", self.city)),
        }
        if self.weather.timeout.is_zero() {
            return Err(anyhow!("weather timeout must be greater than zero"));
        }
        if self.model.class_names.is_empty() {
            return Err(anyhow!("model class_names cannot be empty"));
        }
        if self.model.fallback_class_names.is_empty() {
            return Err(anyhow!("model fallback_class_names cannot be empty"));
        }
        Ok(())
    }

    pub fn keywords(&self) -> Result<PestKeywords> {
        PestKeywords::new(&self.pest_keywords)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<HunterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
