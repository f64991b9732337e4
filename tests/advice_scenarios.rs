//! Field scenarios for the decision rules.
//!
//! These pin the exact message lists for representative counts and
//! temperatures, and check the end-to-end assessment on synthetic photos.

use image::{Rgb, RgbImage};

use stonka_hunter::advice::severity::{
    MSG_BIOLOGICAL, MSG_COOL_DELAY, MSG_HAND_PICK, MSG_HIGH_INFESTATION, MSG_HOT_TIMING,
    MSG_NO_ACTION, MSG_PHOTO_RECORDS, MSG_PREDATORS, MSG_PREVENTION, MSG_RESISTANCE, MSG_ROTATE,
    MSG_SELECTIVE_INSECTICIDE,
};
use stonka_hunter::advice::spray::{
    MSG_CONDITIONS_OK, MSG_TOO_COLD, MSG_TOO_HOT, MSG_WEATHER_UNAVAILABLE,
};
use stonka_hunter::advice::treatment::{TREATMENT_DOSE, TREATMENT_PRODUCT};
use stonka_hunter::detect::{BoundingBox, ColorBackend, DetectedObject, StubBackend, Thresholds};
use stonka_hunter::{
    advise_severity, advise_spray_timing, analyze_image, classify, compose_report, Assessment,
    PestKeywords, SeverityTier, SprayAdvice,
};

fn object(label: &str) -> DetectedObject {
    DetectedObject::new(label, 0.8, BoundingBox::new(0, 0, 8, 8).unwrap())
}

#[test]
fn clean_leaf_without_weather() {
    assert_eq!(
        advise_severity(0, None),
        vec![MSG_NO_ACTION, MSG_PREVENTION, MSG_PHOTO_RECORDS]
    );
}

#[test]
fn light_infestation_on_a_cold_day() {
    assert_eq!(
        advise_severity(3, Some(10.0)),
        vec![MSG_HAND_PICK, MSG_PREDATORS, MSG_COOL_DELAY, MSG_PHOTO_RECORDS]
    );
}

#[test]
fn heavy_infestation_on_a_hot_day() {
    assert_eq!(
        advise_severity(8, Some(30.0)),
        vec![
            MSG_HIGH_INFESTATION,
            MSG_SELECTIVE_INSECTICIDE,
            MSG_RESISTANCE,
            MSG_HOT_TIMING,
            MSG_PHOTO_RECORDS
        ]
    );
}

#[test]
fn moderate_infestation_in_mild_weather() {
    assert_eq!(
        advise_severity(5, Some(20.0)),
        vec![MSG_BIOLOGICAL, MSG_ROTATE, MSG_PHOTO_RECORDS]
    );
}

#[test]
fn spray_timing_verdicts() {
    assert_eq!(advise_spray_timing(None), MSG_WEATHER_UNAVAILABLE);
    assert_eq!(advise_spray_timing(Some(22.0)), MSG_TOO_HOT);
    assert_eq!(advise_spray_timing(Some(3.0)), MSG_TOO_COLD);
    assert_eq!(advise_spray_timing(Some(12.0)), MSG_CONDITIONS_OK);
}

#[test]
fn classification_partitions_completely() {
    let keywords = PestKeywords::default();
    let label_sets: [&[&str]; 4] = [
        &[],
        &["Beetle"],
        &["Ladybird", "Ladybird", "Aphid"],
        &["stonka", "BEETLE", "Ladybird", "potato beetle larva", "Fly"],
    ];
    for labels in label_sets {
        let objects: Vec<DetectedObject> = labels.iter().map(|l| object(l)).collect();
        let result = classify(&objects, &keywords);
        assert_eq!(
            result.pest_count + result.other_counts.values().sum::<usize>(),
            objects.len()
        );
    }
}

#[test]
fn composing_twice_gives_identical_output() {
    let objects = vec![object("Beetle"), object("Ladybird")];
    let classification = classify(&objects, &PestKeywords::default());
    let severity = advise_severity(classification.pest_count, Some(16.0));
    let weather = advise_spray_timing(Some(16.0));

    let first = compose_report(&classification, &severity, &weather);
    let second = compose_report(&classification, &severity, &weather);
    assert_eq!(first, second);
    assert_eq!(first.len(), 1 + 1 + severity.len() + 1);
}

#[test]
fn assessments_from_parallel_threads_agree() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                Assessment::from_detections(
                    vec![object("Beetle"); 6],
                    Some(27.0),
                    &PestKeywords::default(),
                )
            })
        })
        .collect();
    let results: Vec<Assessment> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert!(results[0].headline.celebrate());
}

#[test]
fn stub_detector_drives_full_assessment() {
    let mut detector = StubBackend::new(vec![
        object("Beetle"),
        object("Beetle"),
        object("Beetle"),
        object("Beetle"),
        object("Ladybird"),
    ]);
    let assessment = analyze_image(
        &mut detector,
        &RgbImage::new(32, 32),
        Thresholds::default(),
        Some(3.0),
        &PestKeywords::default(),
    )
    .unwrap();

    assert_eq!(assessment.tier, SeverityTier::Moderate);
    assert_eq!(assessment.spray, SprayAdvice::TooCold);
    assert_eq!(assessment.messages[1], "Other insects detected: Ladybird x1");
    assert!(assessment.messages.contains(&MSG_COOL_DELAY.to_string()));
    assert_eq!(assessment.messages.last().map(String::as_str), Some(MSG_TOO_COLD));
    assert_eq!(
        assessment.treatment,
        vec![
            format!("Product: {}", TREATMENT_PRODUCT),
            format!("Dose: {}", TREATMENT_DOSE),
            "Temperature: currently 3.0°C; see the spray timing advice.".to_string(),
        ]
    );
}

#[test]
fn colour_detector_counts_orange_beetles_on_a_leaf() {
    let mut photo = RgbImage::from_pixel(160, 120, Rgb([45, 130, 50]));
    for (x0, y0) in [(15u32, 15u32), (70, 40), (120, 80)] {
        for y in y0..y0 + 18 {
            for x in x0..x0 + 22 {
                photo.put_pixel(x, y, Rgb([235, 125, 25]));
            }
        }
    }

    let mut detector = ColorBackend::new();
    let assessment = analyze_image(
        &mut detector,
        &photo,
        Thresholds::default(),
        None,
        &PestKeywords::default(),
    )
    .unwrap();

    assert_eq!(assessment.pest_count(), 3);
    assert_eq!(assessment.tier, SeverityTier::Low);
    assert_eq!(assessment.spray, SprayAdvice::Unavailable);
}
