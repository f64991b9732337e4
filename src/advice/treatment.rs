/// Registered product suggested when beetles are found.
pub const TREATMENT_PRODUCT: &str = "Mospilan 20 SP (acetamiprid)";
/// Field dose for `TREATMENT_PRODUCT`.
pub const TREATMENT_DOSE: &str = "0.08 kg/ha";

/// Concrete product, dose and temperature lines for an infested leaf.
///
/// Empty when no beetles were counted.
pub fn advise_treatment(pest_count: usize, temperature_celsius: Option<f64>) -> Vec<String> {
    if pest_count == 0 {
        return Vec::new();
    }
    let temperature = match temperature_celsius {
        Some(t) => format!(
            "Temperature: currently {:.1}°C; see the spray timing advice.",
            t
        ),
        None => "Temperature: unknown; measure it before spraying.".to_string(),
    };
    vec![
        format!("Product: {}", TREATMENT_PRODUCT),
        format!("Dose: {}", TREATMENT_DOSE),
        temperature,
    ]
}
