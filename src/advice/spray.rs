use serde::Serialize;

/// Above this, pyrethroids lose effectiveness.
pub const PYRETHROID_MAX_CELSIUS: f64 = 20.0;
/// Below this, no spray treatment is worth applying.
pub const SPRAY_MIN_CELSIUS: f64 = 5.0;

pub const MSG_WEATHER_UNAVAILABLE: &str =
    "Weather service unavailable: check the temperature before spraying.";
pub const MSG_TOO_HOT: &str =
    "Too hot for pyrethroids (e.g. deltamethrin). Use an acetamiprid-based product instead.";
pub const MSG_TOO_COLD: &str = "Too cold for spraying. Treatment effectiveness will be negligible.";
pub const MSG_CONDITIONS_OK: &str =
    "Conditions OK for most treatments (optimum 10-20°C).";

/// Spray-timing verdict for the current temperature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SprayAdvice {
    Unavailable,
    TooHot,
    TooCold,
    Suitable,
}

impl SprayAdvice {
    pub fn from_temperature(temperature_celsius: Option<f64>) -> Self {
        match temperature_celsius {
            None => SprayAdvice::Unavailable,
            Some(t) if t > PYRETHROID_MAX_CELSIUS => SprayAdvice::TooHot,
            Some(t) if t < SPRAY_MIN_CELSIUS => SprayAdvice::TooCold,
            Some(_) => SprayAdvice::Suitable,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SprayAdvice::Unavailable => MSG_WEATHER_UNAVAILABLE,
            SprayAdvice::TooHot => MSG_TOO_HOT,
            SprayAdvice::TooCold => MSG_TOO_COLD,
            SprayAdvice::Suitable => MSG_CONDITIONS_OK,
        }
    }
}

pub fn advise_spray_timing(temperature_celsius: Option<f64>) -> String {
    SprayAdvice::from_temperature(temperature_celsius)
        .message()
        .to_string()
}
