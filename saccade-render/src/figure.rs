use saccade_core::Overlay;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One line in a panel. `None` samples leave a gap in the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<String>,
    pub values: Vec<Option<f64>>,
    pub color: [u8; 4],
    pub width: f32,
}

impl Series {
    /// Non-finite samples become gaps.
    pub fn from_trace(trace: &[f64], color: [u8; 4]) -> Self {
        Self {
            label: None,
            values: trace
                .iter()
                .map(|&v| v.is_finite().then_some(v))
                .collect(),
            color,
            width: 1.5,
        }
    }

    pub fn from_overlay(overlay: &Overlay, color: [u8; 4]) -> Self {
        Self {
            label: None,
            values: overlay.values().to_vec(),
            color,
            width: 2.5,
        }
    }

    pub fn from_mask(mask: &[u8], color: [u8; 4]) -> Self {
        Self {
            label: None,
            values: mask.iter().map(|&l| Some(l as f64)).collect(),
            color,
            width: 1.5,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub y_label: Option<String>,
    pub series: Vec<Series>,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    /// Finite (min, max) over every series, or `None` when nothing is drawable.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Vertically stacked panels sharing one sample axis
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            title: None,
            x_label: None,
            width,
            height,
            panels: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }

    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }

    /// Longest series in the figure; sets the shared x axis.
    pub fn sample_count(&self) -> usize {
        self.panels
            .iter()
            .flat_map(|p| p.series.iter())
            .map(|s| s.values.len())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    /// PNG written by the run
    pub output: PathBuf,
    /// TrueType/OpenType font overriding the bundled DejaVu Sans
    pub font_path: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            output: PathBuf::from("saccades.png"),
            font_path: None,
        }
    }
}

impl PlotConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.width < 100 || self.height < 100 {
            return Err("plot must be at least 100x100 pixels".to_string());
        }
        if self.width > 16_384 || self.height > 16_384 {
            return Err("plot too large (max 16384 pixels per side)".to_string());
        }
        if self.output.as_os_str().is_empty() {
            return Err("output path must not be empty".to_string());
        }
        Ok(())
    }
}
