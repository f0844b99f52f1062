use saccade_app::{App, PipelineConfig};
use saccade_core::{Matrix, Prediction, SaccadeClassifier, SaccadeError};
use saccade_data::{DataConfig, SyntheticConfig};
use saccade_render::PlotConfig;
use std::path::Path;
use tempfile::TempDir;

fn synthetic_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let synthetic = SyntheticConfig {
        trials: 8,
        samples: 1500,
        seed: 7,
        ..SyntheticConfig::default()
    };
    App::synthesize(&synthetic, dir.path()).unwrap();
    dir
}

fn config_for(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        data: DataConfig {
            datapath: dir.to_path_buf(),
            labels_filename: Some("Labels.csv".to_string()),
            ..DataConfig::default()
        },
        plot: PlotConfig {
            width: 400,
            height: 300,
            output: dir.join("plot.png"),
            font_path: None,
        },
        ..PipelineConfig::default()
    }
}

fn saccade_error(err: &anyhow::Error) -> &SaccadeError {
    err.downcast_ref::<SaccadeError>()
        .unwrap_or_else(|| panic!("Expected a SaccadeError, got {err:?}"))
}

#[test]
fn test_synth_then_run_writes_png() {
    let dir = synthetic_dir();
    for name in ["X.csv", "Y.csv", "Labels.csv"] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }

    let config = PipelineConfig {
        trial: 3,
        ..config_for(dir.path())
    };
    let summary = App::new(config).unwrap().run().unwrap();

    assert_eq!(summary.trials, 8);
    assert_eq!(summary.samples, 1500);
    assert_eq!(summary.trial, 3);
    assert!(summary.saccades > 0);
    assert!(summary.output.is_file());

    let png = std::fs::read(&summary.output).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let metrics = summary.metrics.expect("labels were configured");
    assert!(metrics.f1 > 0.8, "F1 too low: {metrics:?}");
}

#[test]
fn test_run_without_labels_skips_metrics() {
    let dir = synthetic_dir();
    let mut config = config_for(dir.path());
    config.data.labels_filename = None;
    config.data.y_filename = None;

    let summary = App::new(config).unwrap().run().unwrap();
    assert!(summary.metrics.is_none());
}

#[test]
fn test_trial_out_of_range() {
    let dir = synthetic_dir();
    let config = PipelineConfig {
        trial: 8,
        ..config_for(dir.path())
    };
    let output = config.plot.output.clone();

    let err = App::new(config).unwrap().run().unwrap_err();
    assert!(matches!(
        saccade_error(&err),
        SaccadeError::OutOfRange { index: 8, len: 8 }
    ));
    assert!(!output.exists());
}

#[test]
fn test_missing_data_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = App::new(config_for(dir.path())).unwrap().run().unwrap_err();
    assert!(matches!(
        saccade_error(&err),
        SaccadeError::ResourceNotFound { .. }
    ));
}

#[test]
fn test_unknown_weights_is_fatal() {
    let dir = synthetic_dir();
    let mut config = config_for(dir.path());
    config.detector.weights_name = "weights_missing".to_string();

    let err = App::new(config).unwrap().run().unwrap_err();
    assert!(matches!(
        saccade_error(&err),
        SaccadeError::ResourceNotFound { kind: "weights", .. }
    ));
}

#[derive(Debug)]
struct FailingClassifier;

impl SaccadeClassifier for FailingClassifier {
    fn predict(
        &self,
        _x: &Matrix<f64>,
        _y: Option<&Matrix<f64>>,
    ) -> saccade_core::Result<Prediction> {
        Err(SaccadeError::Classifier("model diverged".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Returns one sample too few per row.
#[derive(Debug)]
struct TruncatingClassifier;

impl SaccadeClassifier for TruncatingClassifier {
    fn predict(
        &self,
        x: &Matrix<f64>,
        _y: Option<&Matrix<f64>>,
    ) -> saccade_core::Result<Prediction> {
        let (rows, cols) = x.shape();
        Ok(Prediction {
            labels: Matrix::filled(rows, cols - 1, 0),
            probability: Matrix::filled(rows, cols - 1, 0.0),
        })
    }

    fn name(&self) -> &str {
        "truncating"
    }
}

#[test]
fn test_classifier_failure_propagates() {
    let dir = synthetic_dir();
    let config = config_for(dir.path());
    let output = config.plot.output.clone();

    let err = App::new(config)
        .unwrap()
        .with_classifier(Box::new(FailingClassifier))
        .run()
        .unwrap_err();
    match saccade_error(&err) {
        SaccadeError::Classifier(message) => assert_eq!(message, "model diverged"),
        other => panic!("Expected Classifier error, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_prediction_shape_is_verified() {
    let dir = synthetic_dir();
    let err = App::new(config_for(dir.path()))
        .unwrap()
        .with_classifier(Box::new(TruncatingClassifier))
        .run()
        .unwrap_err();
    assert!(matches!(
        saccade_error(&err),
        SaccadeError::ShapeMismatch { .. }
    ));
}

#[test]
fn test_labels_gallery() {
    let dir = synthetic_dir();
    let output = App::new(config_for(dir.path()))
        .unwrap()
        .labels(2, 4)
        .unwrap();
    assert!(output.is_file());

    let err = App::new(config_for(dir.path()))
        .unwrap()
        .labels(6, 4)
        .unwrap_err();
    assert!(matches!(
        saccade_error(&err),
        SaccadeError::OutOfRange { index: 8, .. }
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let config = PipelineConfig {
        plot: PlotConfig {
            width: 10,
            ..PlotConfig::default()
        },
        ..PipelineConfig::default()
    };
    assert!(App::new(config).is_err());
}
