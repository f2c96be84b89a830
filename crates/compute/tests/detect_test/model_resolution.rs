use hydrowatch_compute::{Architecture, Detector, LstmAutoencoder, ModelSource};
use hydrowatch_core::Config;

use crate::helpers::{station_reading, test_data_dir, STABLE};

fn config_with_model(path: std::path::PathBuf) -> Config {
    let mut config = Config::for_profile("HWTEST_RESOLUTION");
    config.detection.model_path = path;
    config.alert.sender = None;
    config
}

#[tokio::test]
async fn detector_runs_on_fallback_when_artifact_missing() {
    let dir = test_data_dir();
    let d = Detector::from_config(&config_with_model(dir.join("missing.json"))).unwrap();
    assert!(d.model().is_fallback());

    for i in 0..3 {
        d.detect(station_reading(i, STABLE)).await;
    }
    assert_eq!(d.metrics().windows_scored, 1);
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn detector_uses_saved_artifact() {
    let dir = test_data_dir();
    let path = dir.join("models").join("lstm_autoencoder.json");
    LstmAutoencoder::untrained(Architecture::default(), 7)
        .unwrap()
        .save(&path)
        .unwrap();

    let d = Detector::from_config(&config_with_model(path.clone())).unwrap();
    assert_eq!(d.model().source(), &ModelSource::Loaded { path });
    let _ = std::fs::remove_dir_all(dir);
}
