use std::collections::HashMap;

use anyhow::{anyhow, Result};
use image::RgbImage;

use crate::detect::result::{DetectedObject, Thresholds};

use super::backend::DetectorBackend;

/// Registry of detector backends owned by the process.
///
/// The CLI loads backends once at start-up and hands the registry to the
/// analysis pipeline; nothing in the crate caches a model globally.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn DetectorBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        self.register_boxed(Box::new(backend));
    }

    pub fn register_boxed(&mut self, backend: Box<dyn DetectorBackend>) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, backend);
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Get backend by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn DetectorBackend + 'static)> {
        self.backends.get_mut(name).map(|b| b.as_mut())
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run detection with the default backend.
    pub fn detect(&mut self, image: &RgbImage, thresholds: Thresholds) -> Result<Vec<DetectedObject>> {
        let name = self
            .default_name
            .clone()
            .ok_or_else(|| anyhow!("no detector backend registered"))?;
        let backend = self
            .get_mut(&name)
            .ok_or_else(|| anyhow!("default backend '{}' missing", name))?;
        backend.detect(image, thresholds)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::StubBackend;
    use crate::detect::result::BoundingBox;

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        assert!(registry
            .detect(&RgbImage::new(4, 4), Thresholds::default())
            .is_err());

        let bbox = BoundingBox::new(0, 0, 2, 2).unwrap();
        registry.register(StubBackend::new(vec![DetectedObject::new("Beetle", 0.9, bbox)]));
        assert_eq!(registry.default_name(), Some("stub"));
        assert_eq!(registry.list(), vec!["stub".to_string()]);

        let found = registry
            .detect(&RgbImage::new(4, 4), Thresholds::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(registry.set_default("missing").is_err());
    }
}
