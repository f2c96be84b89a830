use std::sync::atomic::Ordering;

use hydrowatch_compute::Detection;
use hydrowatch_notify::AlertDispatcher;

use crate::helpers::{
    detector, fallback_model, reading_at, station_reading, zero_model, CountingModel, LEVEL_JUMP,
    STABLE, STATION, SURGE,
};

#[tokio::test]
async fn short_windows_never_reach_the_model() {
    let (model, calls) = CountingModel::new(fallback_model());
    let d = detector(model, AlertDispatcher::disabled());

    let first = d.detect(station_reading(0, STABLE)).await;
    let second = d.detect(station_reading(1, SURGE)).await;

    assert!(matches!(first, Detection::WindowFilling { len: 1, required: 3 }));
    assert!(matches!(second, Detection::WindowFilling { len: 2, required: 3 }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    d.detect(station_reading(2, STABLE)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn identical_readings_score_near_zero() {
    for model in [zero_model(), fallback_model()] {
        let d = detector(model, AlertDispatcher::disabled());
        d.detect(station_reading(0, STABLE)).await;
        d.detect(station_reading(1, STABLE)).await;
        let detection = d.detect(station_reading(2, STABLE)).await;

        let verdict = detection.verdict().expect("full window is scored");
        assert!(verdict.score.abs() < 1e-9, "score {}", verdict.score);
        assert!(!verdict.is_anomaly);
        assert_eq!(verdict.threshold, 0.1);
        assert!(detection.alert().is_none());
    }
}

#[tokio::test]
async fn divergent_reading_is_anomalous_and_alerts() {
    let d = detector(zero_model(), AlertDispatcher::disabled());
    d.detect(station_reading(0, STABLE)).await;
    d.detect(station_reading(1, STABLE)).await;
    let detection = d.detect(station_reading(2, SURGE)).await;

    let verdict = detection.verdict().expect("full window is scored");
    assert!((verdict.score - 7.0 / 15.0).abs() < 1e-12, "score {}", verdict.score);
    assert!(verdict.is_anomaly);
    // Disabled dispatcher: an attempt is made and reported as skipped.
    assert_eq!(detection.alert().map(|a| a.label()), Some("skipped"));

    let m = d.metrics();
    assert_eq!(m.anomalies_detected, 1);
    assert_eq!(m.alerts_skipped, 1);
}

#[tokio::test]
async fn water_level_jump_alone_stays_below_threshold() {
    // Per-window scaling maps the jump to a single 1.0 among fifteen cells:
    // against an all-zero reconstruction the error is 1/15, under 0.1.
    let d = detector(zero_model(), AlertDispatcher::disabled());
    d.detect(station_reading(0, STABLE)).await;
    d.detect(station_reading(1, STABLE)).await;
    let detection = d.detect(station_reading(2, LEVEL_JUMP)).await;

    let verdict = detection.verdict().expect("full window is scored");
    assert!((verdict.score - 1.0 / 15.0).abs() < 1e-12, "score {}", verdict.score);
    assert!(!verdict.is_anomaly);
    assert!(detection.alert().is_none());
}

#[tokio::test]
async fn spike_leaves_the_window_after_three_readings() {
    let d = detector(zero_model(), AlertDispatcher::disabled());
    d.detect(station_reading(0, STABLE)).await;
    d.detect(station_reading(1, STABLE)).await;
    assert!(d.detect(station_reading(2, SURGE)).await.is_anomaly());
    assert!(d.detect(station_reading(3, STABLE)).await.is_anomaly());
    assert!(d.detect(station_reading(4, STABLE)).await.is_anomaly());
    assert!(!d.detect(station_reading(5, STABLE)).await.is_anomaly());
}

#[tokio::test]
async fn fallback_model_scores_repeatably() {
    let a = detector(fallback_model(), AlertDispatcher::disabled());
    let b = detector(fallback_model(), AlertDispatcher::disabled());
    let mut last = (None, None);
    for (i, features) in [STABLE, STABLE, SURGE].into_iter().enumerate() {
        last = (
            a.detect(station_reading(i as i64, features)).await.verdict().copied(),
            b.detect(station_reading(i as i64, features)).await.verdict().copied(),
        );
    }
    let (va, vb) = last;
    assert!(va.is_some());
    assert_eq!(va, vb);
}

#[tokio::test]
async fn locations_fill_and_scale_independently() {
    let other = (19.07, 72.88);
    let d = detector(zero_model(), AlertDispatcher::disabled());

    d.detect(reading_at(STATION, 0, STABLE)).await;
    d.detect(reading_at(other, 0, SURGE)).await;
    d.detect(reading_at(STATION, 1, STABLE)).await;
    let other_second = d.detect(reading_at(other, 1, SURGE)).await;
    let station_third = d.detect(reading_at(STATION, 2, STABLE)).await;

    assert!(matches!(other_second, Detection::WindowFilling { len: 2, .. }));
    // The other station's surge values never enter this station's scaling.
    assert_eq!(station_third.verdict().map(|v| v.score), Some(0.0));
    assert_eq!(d.windows().locations(), 2);
}

#[tokio::test]
async fn malformed_reading_does_not_disturb_the_window() {
    let d = detector(zero_model(), AlertDispatcher::disabled());
    d.detect(station_reading(0, STABLE)).await;
    let bad = d.detect(station_reading(1, [f64::NAN, 20.0, 0.0, 7.0, 8.0])).await;
    assert!(matches!(bad, Detection::Rejected { .. }));

    let next = d.detect(station_reading(2, STABLE)).await;
    assert!(matches!(next, Detection::WindowFilling { len: 2, .. }));
}
