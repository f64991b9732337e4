use serde::Serialize;

/// Upper bound (inclusive) of the light-infestation tier.
pub const LOW_TIER_MAX: usize = 3;
/// Upper bound (inclusive) of the moderate tier; anything above is high.
pub const MODERATE_TIER_MAX: usize = 7;

/// Below this, beetle activity is reduced and treatment can wait.
pub const COOL_ACTIVITY_CELSIUS: f64 = 15.0;
/// Above this, treatments should move to the cooler parts of the day.
pub const HOT_ACTIVITY_CELSIUS: f64 = 25.0;

pub const MSG_NO_ACTION: &str = "No immediate action required. Continue weekly monitoring.";
pub const MSG_PREVENTION: &str = "Maintain crop rotation and healthy soil to prevent outbreaks.";
pub const MSG_HAND_PICK: &str = "Hand-pick beetles and larvae early in the morning.";
pub const MSG_PREDATORS: &str =
    "Encourage natural predators like ladybirds and ground beetles.";
pub const MSG_BIOLOGICAL: &str =
    "Consider biological treatments (Neem oil, Bacillus thuringiensis).";
pub const MSG_ROTATE: &str = "Rotate crops next season to break the beetle life cycle.";
pub const MSG_HIGH_INFESTATION: &str = "High infestation detected.";
pub const MSG_SELECTIVE_INSECTICIDE: &str =
    "Use selective insecticides only if other methods fail.";
pub const MSG_RESISTANCE: &str =
    "Avoid repeated use of the same chemical to prevent resistance.";
pub const MSG_COOL_DELAY: &str = "Low temperature: beetle activity is reduced. Delay spraying.";
pub const MSG_HOT_TIMING: &str = "High temperature: apply treatments early morning or evening.";
pub const MSG_PHOTO_RECORDS: &str = "Keep photo records to track infestation trends over time.";

/// Count-based infestation bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Clear,
    Low,
    Moderate,
    High,
}

impl SeverityTier {
    pub fn from_count(pest_count: usize) -> Self {
        match pest_count {
            0 => SeverityTier::Clear,
            1..=LOW_TIER_MAX => SeverityTier::Low,
            n if n <= MODERATE_TIER_MAX => SeverityTier::Moderate,
            _ => SeverityTier::High,
        }
    }

    fn messages(self) -> &'static [&'static str] {
        match self {
            SeverityTier::Clear => &[MSG_NO_ACTION, MSG_PREVENTION],
            SeverityTier::Low => &[MSG_HAND_PICK, MSG_PREDATORS],
            SeverityTier::Moderate => &[MSG_BIOLOGICAL, MSG_ROTATE],
            SeverityTier::High => &[
                MSG_HIGH_INFESTATION,
                MSG_SELECTIVE_INSECTICIDE,
                MSG_RESISTANCE,
            ],
        }
    }
}

fn activity_modifier(temperature_celsius: f64) -> Option<&'static str> {
    if temperature_celsius < COOL_ACTIVITY_CELSIUS {
        Some(MSG_COOL_DELAY)
    } else if temperature_celsius > HOT_ACTIVITY_CELSIUS {
        Some(MSG_HOT_TIMING)
    } else {
        None
    }
}

/// Recommendations for a beetle count, in display order.
///
/// The temperature modifier applies only when beetles were found; the
/// photo-record reminder closes every list.
pub fn advise_severity(pest_count: usize, temperature_celsius: Option<f64>) -> Vec<String> {
    let tier = SeverityTier::from_count(pest_count);
    let mut out: Vec<String> = tier.messages().iter().map(|m| m.to_string()).collect();

    if tier != SeverityTier::Clear {
        if let Some(modifier) = temperature_celsius.and_then(activity_modifier) {
            out.push(modifier.to_string());
        }
    }

    out.push(MSG_PHOTO_RECORDS.to_string());
    out
}
