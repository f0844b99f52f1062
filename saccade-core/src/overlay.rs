use crate::error::{Result, SaccadeError};

/// Highlight series aligned with a trace. `None` marks an absent sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Overlay {
    values: Vec<Option<f64>>,
}

impl Overlay {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Option<f64>> {
        self.values.get(index).copied()
    }

    /// Absent samples must be tested here, never by comparing against NaN.
    pub fn is_absent(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(None))
    }

    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Option<f64>> {
        self.values
    }

    /// NaN-sentinel view for plotting code that expects plain floats.
    pub fn to_nan_vec(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }
}

/// Keeps `trace[i]` where `mask[i] == 1` and marks every other sample absent.
pub fn build_overlay(trace: &[f64], mask: &[u8]) -> Result<Overlay> {
    if trace.len() != mask.len() {
        return Err(SaccadeError::shape_mismatch(
            "overlay",
            format!("mask of length {}", trace.len()),
            format!("length {}", mask.len()),
        ));
    }

    let values = trace
        .iter()
        .zip(mask)
        .enumerate()
        .map(|(index, (&x, &label))| match label {
            1 => Ok(Some(x)),
            0 => Ok(None),
            value => Err(SaccadeError::InvalidLabel { index, value }),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Overlay { values })
}

/// Shifts a trace so its smallest finite sample sits at zero.
pub fn baseline_shift(trace: &[f64]) -> Vec<f64> {
    let min = trace
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return trace.to_vec();
    }
    trace.iter().map(|v| v - min).collect()
}

/// Converts float labels (as loaded from CSV) into a 0/1 mask.
pub fn mask_from_values(values: &[f64]) -> Result<Vec<u8>> {
    values
        .iter()
        .enumerate()
        .map(|(index, &v)| {
            if v == 0.0 {
                Ok(0)
            } else if v == 1.0 {
                Ok(1)
            } else {
                Err(SaccadeError::InvalidLabelValue { index, value: v })
            }
        })
        .collect()
}

/// Half-open interval `[onset, offset)` of consecutive saccade samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaccadeRun {
    pub onset: usize,
    pub offset: usize,
}

impl SaccadeRun {
    pub fn len(&self) -> usize {
        self.offset - self.onset
    }

    pub fn is_empty(&self) -> bool {
        self.offset == self.onset
    }
}

/// Runs of nonzero labels in order of onset.
pub fn saccade_runs(mask: &[u8]) -> Vec<SaccadeRun> {
    let mut runs = Vec::new();
    let mut onset = None;
    for (i, &label) in mask.iter().enumerate() {
        match (label != 0, onset) {
            (true, None) => onset = Some(i),
            (false, Some(start)) => {
                runs.push(SaccadeRun {
                    onset: start,
                    offset: i,
                });
                onset = None;
            }
            _ => {}
        }
    }
    if let Some(start) = onset {
        runs.push(SaccadeRun {
            onset: start,
            offset: mask.len(),
        });
    }
    runs
}
