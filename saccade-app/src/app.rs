use anyhow::{Context, Result};
use saccade_core::{
    Overlay, SaccadeClassifier, SaccadeError, baseline_shift, build_overlay, saccade_runs,
};
use saccade_data::{SyntheticConfig, generate, load_labels, load_matrix, load_optional, write_csv};
use saccade_detect::{Metrics, VelocityClassifier, evaluate};
use saccade_render::{Figure, FigureRenderer, Panel, PlotConfig, Series, SkiaRenderer, save_png};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TRACE_COLOR: [u8; 4] = [0, 128, 204, 255];
const OVERLAY_COLOR: [u8; 4] = [255, 127, 14, 255];
const PREDICTION_COLOR: [u8; 4] = [0, 153, 77, 255];

/// What a completed run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub trials: usize,
    pub samples: usize,
    pub trial: usize,
    /// Saccades predicted in the plotted trial
    pub saccades: usize,
    pub output: PathBuf,
    /// Present when a ground-truth labels file is configured
    pub metrics: Option<Metrics>,
}

pub struct App {
    config: crate::PipelineConfig,
    classifier: Option<Box<dyn SaccadeClassifier>>,
}

impl App {
    pub fn new(config: crate::PipelineConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        Ok(Self {
            config,
            classifier: None,
        })
    }

    /// Uses `classifier` instead of building one from the detector settings.
    pub fn with_classifier(mut self, classifier: Box<dyn SaccadeClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn config(&self) -> &crate::PipelineConfig {
        &self.config
    }

    /// Load, classify, select the configured trial, overlay and plot.
    pub fn run(&self) -> Result<RunSummary> {
        let data = &self.config.data;
        let x_path = data.x_path();
        let x = load_matrix(&x_path)
            .with_context(|| format!("loading horizontal traces from {}", x_path.display()))?;
        let y = load_optional(data.y_path().as_deref()).context("loading vertical traces")?;

        let built;
        let classifier: &dyn SaccadeClassifier = match &self.classifier {
            Some(classifier) => classifier.as_ref(),
            None => {
                built = VelocityClassifier::from_config(self.config.detector.clone())
                    .context("building classifier")?;
                &built
            }
        };

        info!(
            "Classifying {} trials x {} samples with {}",
            x.rows(),
            x.cols(),
            classifier.name()
        );
        let prediction = classifier.predict(&x, y.as_ref())?;
        x.ensure_same_shape(&prediction.labels, "predicted labels")?;
        x.ensure_same_shape(&prediction.probability, "predicted probability")?;

        let trial = self.config.trial;
        let trace = x
            .row(trial)
            .with_context(|| format!("selecting trial {trial}"))?;
        let labels = prediction.labels.row(trial)?;
        let shifted = baseline_shift(trace);
        let overlay = build_overlay(&shifted, labels)?;
        let saccades = saccade_runs(labels).len();
        debug!(
            "Trial {}: {} saccades, {} overlay samples",
            trial,
            saccades,
            overlay.present_count()
        );

        let metrics = match data.labels_path() {
            Some(path) => {
                let truth = load_labels(&path)
                    .with_context(|| format!("loading labels from {}", path.display()))?;
                let metrics = evaluate(&truth, &prediction.labels)?;
                info!(
                    "Precision {:.3}, recall {:.3}, F1 {:.3}",
                    metrics.precision, metrics.recall, metrics.f1
                );
                Some(metrics)
            }
            None => None,
        };

        let figure = prediction_figure(&self.config.plot, &shifted, &overlay, labels);
        let output = self.write_figure(&figure)?;

        info!("done");
        Ok(RunSummary {
            trials: x.rows(),
            samples: x.cols(),
            trial,
            saccades,
            output,
            metrics,
        })
    }

    /// Ground-truth gallery of `count` consecutive trials starting at `start`.
    pub fn labels(&self, start: usize, count: usize) -> Result<PathBuf> {
        if count == 0 {
            return Err(SaccadeError::Config("gallery needs at least one trial".to_string()).into());
        }
        let labels_path = self.config.data.labels_path().ok_or_else(|| {
            SaccadeError::Config("data.labels_filename is required for the gallery".to_string())
        })?;

        let x = load_matrix(&self.config.data.x_path())?;
        let truth = load_labels(&labels_path)?;
        x.ensure_same_shape(&truth, "ground-truth labels")?;

        let rows = (start..start.saturating_add(count))
            .map(|r| Ok((r, x.row(r)?, truth.row(r)?)))
            .collect::<saccade_core::Result<Vec<_>>>()?;
        let figure = labels_figure(&self.config.plot, &rows)?;
        let output = self.write_figure(&figure)?;

        info!("Wrote gallery of trials {}..{}", start, start + count);
        Ok(output)
    }

    /// Writes `X.csv`, `Y.csv` and `Labels.csv` into `out`.
    pub fn synthesize(config: &SyntheticConfig, out: &Path) -> Result<()> {
        let dataset = generate(config)?;
        write_csv(&out.join("X.csv"), &dataset.x)?;
        write_csv(&out.join("Y.csv"), &dataset.y)?;
        write_csv(&out.join("Labels.csv"), &dataset.labels)?;
        info!(
            "Wrote {} synthetic trials x {} samples to {}",
            config.trials,
            config.samples,
            out.display()
        );
        Ok(())
    }

    fn write_figure(&self, figure: &Figure) -> Result<PathBuf> {
        let plot = &self.config.plot;
        let mut renderer = SkiaRenderer::from_config(plot)?;
        if !renderer.has_text() {
            debug!("No font configured, labels are omitted");
        }
        let pixmap = renderer.render(figure)?;
        save_png(&pixmap, &plot.output)
            .with_context(|| format!("writing {}", plot.output.display()))?;
        Ok(plot.output.clone())
    }
}

/// Two panels: shifted trace with its saccade overlay, then the binary prediction.
pub fn prediction_figure(
    plot: &PlotConfig,
    shifted: &[f64],
    overlay: &Overlay,
    labels: &[u8],
) -> Figure {
    Figure::new(plot.width, plot.height)
        .with_title("Example")
        .with_x_label("Time")
        .with_panel(
            Panel::new()
                .with_y_label("Eye pos")
                .with_series(Series::from_trace(shifted, TRACE_COLOR))
                .with_series(Series::from_overlay(overlay, OVERLAY_COLOR)),
        )
        .with_panel(
            Panel::new().with_series(
                Series::from_mask(labels, PREDICTION_COLOR).with_label("Binary prediction"),
            ),
        )
}

/// One panel per `(row, trace, labels)` with the ground-truth overlay.
pub fn labels_figure(
    plot: &PlotConfig,
    rows: &[(usize, &[f64], &[u8])],
) -> saccade_core::Result<Figure> {
    let mut figure = Figure::new(plot.width, plot.height)
        .with_title("Ground truth")
        .with_x_label("Time");
    for &(row, trace, labels) in rows {
        let overlay = build_overlay(trace, labels)?;
        figure = figure.with_panel(
            Panel::new()
                .with_y_label(format!("Trial {row}"))
                .with_series(Series::from_trace(trace, TRACE_COLOR))
                .with_series(Series::from_overlay(&overlay, OVERLAY_COLOR)),
        );
    }
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_figure_layout() {
        let plot = PlotConfig::default();
        let shifted = [0.0, 0.5, 1.0, 1.0];
        let labels = [0u8, 1, 1, 0];
        let overlay = build_overlay(&shifted, &labels).unwrap();

        let figure = prediction_figure(&plot, &shifted, &overlay, &labels);
        assert_eq!(figure.panels.len(), 2);
        assert_eq!(figure.panels[0].series.len(), 2);
        assert_eq!(figure.panels[0].series[0].color, TRACE_COLOR);
        assert_eq!(
            figure.panels[0].series[1].values,
            vec![None, Some(0.5), Some(1.0), None]
        );
        assert_eq!(figure.title.as_deref(), Some("Example"));
        assert_eq!(figure.x_label.as_deref(), Some("Time"));
        assert_eq!(figure.panels[0].y_label.as_deref(), Some("Eye pos"));
        assert_eq!(
            figure.panels[1].series[0].label.as_deref(),
            Some("Binary prediction")
        );
        assert_eq!(figure.panels[1].value_range(), Some((0.0, 1.0)));
        assert_eq!(figure.sample_count(), 4);
    }

    #[test]
    fn test_labels_figure_one_panel_per_row() {
        let plot = PlotConfig::default();
        let (a, la) = ([1.0, 2.0, 3.0], [0u8, 1, 0]);
        let (b, lb) = ([4.0, 5.0, 6.0], [1u8, 1, 0]);
        let rows = vec![(5, &a[..], &la[..]), (6, &b[..], &lb[..])];

        let figure = labels_figure(&plot, &rows).unwrap();
        assert_eq!(figure.panels.len(), 2);
        assert_eq!(figure.panels[1].y_label.as_deref(), Some("Trial 6"));
    }

    #[test]
    fn test_labels_figure_rejects_bad_mask() {
        let plot = PlotConfig::default();
        let (a, la) = ([1.0, 2.0], [0u8, 1, 0]);
        let rows = vec![(0, &a[..], &la[..])];
        assert!(matches!(
            labels_figure(&plot, &rows),
            Err(SaccadeError::ShapeMismatch { .. })
        ));
    }
}
