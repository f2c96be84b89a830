use std::sync::atomic::Ordering;

use hydrowatch_core::config::AlertConfig;
use hydrowatch_notify::{AlertDispatcher, AlertOutcome};

use crate::helpers::{detector, station_reading, zero_model, RecordingNotifier, STABLE, SURGE};

async fn feed_surge(d: &hydrowatch_compute::Detector) -> hydrowatch_compute::Detection {
    d.detect(station_reading(0, STABLE)).await;
    d.detect(station_reading(1, STABLE)).await;
    d.detect(station_reading(2, SURGE)).await
}

#[tokio::test]
async fn anomaly_report_is_delivered_once() {
    let notifier = RecordingNotifier::new(false);
    let delivered = notifier.delivered.clone();
    let attempts = notifier.attempts.clone();
    let d = detector(
        zero_model(),
        AlertDispatcher::with_notifier(Box::new(notifier), "DWLR Anomaly Alert"),
    );

    let detection = feed_surge(&d).await;
    assert_eq!(detection.alert(), Some(&AlertOutcome::Sent));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    let delivered = delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].subject, "DWLR Anomaly Alert");
    let body = &delivered[0].body;
    assert!(body.starts_with("ANOMALY DETECTED"));
    assert!(body.contains("Location: 26.91, 75.79"), "got: {body}");
    assert!(body.contains("Timestamp: 2024-09-01 00:02:00"));
    assert!(body.contains("Water Level: 500.0"));
    assert!(body.contains("Dissolved Oxygen: 2.0"));
    assert_eq!(d.metrics().alerts_sent, 1);
}

#[tokio::test]
async fn transport_failure_still_returns_the_verdict() {
    let notifier = RecordingNotifier::new(true);
    let attempts = notifier.attempts.clone();
    let d = detector(
        zero_model(),
        AlertDispatcher::with_notifier(Box::new(notifier), "DWLR Anomaly Alert"),
    );

    let detection = feed_surge(&d).await;
    let verdict = detection.verdict().expect("verdict survives delivery failure");
    assert!(verdict.is_anomaly);
    match detection.alert() {
        Some(AlertOutcome::Failed { reason }) => assert!(reason.contains("535")),
        other => panic!("expected failed delivery, got {other:?}"),
    }
    // Attempt-once: no retry.
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(d.metrics().alerts_failed, 1);
}

#[tokio::test]
async fn missing_credentials_skip_delivery() {
    let full = AlertConfig {
        sender: Some("station@example.com".to_string()),
        recipient: Some("officer@example.com".to_string()),
        password: Some("secret".to_string()),
        ..AlertConfig::default()
    };
    let partials = [
        AlertConfig { sender: None, ..full.clone() },
        AlertConfig { recipient: None, ..full.clone() },
        AlertConfig { password: None, ..full.clone() },
    ];

    for config in partials {
        let d = detector(zero_model(), AlertDispatcher::from_config(&config));
        let detection = feed_surge(&d).await;
        assert!(detection.is_anomaly());
        assert!(
            matches!(detection.alert(), Some(AlertOutcome::Skipped { .. })),
            "got {:?}",
            detection.alert()
        );
    }
}

#[tokio::test]
async fn unreachable_smtp_server_fails_soft() {
    let config = AlertConfig {
        sender: Some("station@example.com".to_string()),
        recipient: Some("officer@example.com".to_string()),
        password: Some("secret".to_string()),
        smtp_host: "127.0.0.1".to_string(),
        smtp_port: 1,
        tls: false,
        timeout_secs: 2,
        ..AlertConfig::default()
    };
    let d = detector(zero_model(), AlertDispatcher::from_config(&config));
    let detection = feed_surge(&d).await;
    assert!(detection.is_anomaly());
    assert_eq!(detection.alert().map(|a| a.label()), Some("failed"));
}
