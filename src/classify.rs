//! Partition of detector output into target pest vs other species.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::detect::DetectedObject;

/// Keywords used when no configuration overrides them.
pub const DEFAULT_PEST_KEYWORDS: &[&str] = &["beetle", "stonka"];

/// Case-insensitive keyword set identifying the target pest.
///
/// Detector vocabularies vary per trained model, so the set is configuration
/// rather than a fixed enum. A label matches when it contains any keyword.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PestKeywords {
    keywords: Vec<String>,
}

impl PestKeywords {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        if normalized.is_empty() {
            return Err(anyhow!("pest keyword set cannot be empty"));
        }
        Ok(Self {
            keywords: normalized,
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_pest(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.keywords.iter().any(|k| label.contains(k.as_str()))
    }
}

impl Default for PestKeywords {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_PEST_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Counts per bucket. `pest_count + other_total() == input length`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub pest_count: usize,
    pub other_counts: BTreeMap<String, usize>,
}

impl ClassificationResult {
    pub fn other_total(&self) -> usize {
        self.other_counts.values().sum()
    }

    pub fn total(&self) -> usize {
        self.pest_count + self.other_total()
    }
}

pub fn classify(objects: &[DetectedObject], keywords: &PestKeywords) -> ClassificationResult {
    let mut result = ClassificationResult::default();
    for object in objects {
        if keywords.is_pest(&object.label) {
            result.pest_count += 1;
        } else {
            *result.other_counts.entry(object.label.clone()).or_insert(0) += 1;
        }
    }
    result
}
