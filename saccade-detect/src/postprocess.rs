use saccade_core::saccade_runs;

/// Fills gaps shorter than `min_gap` samples between consecutive saccades.
pub fn merge_close(mask: &mut [u8], min_gap: usize) {
    let runs = saccade_runs(mask);
    for pair in runs.windows(2) {
        let gap = pair[1].onset - pair[0].offset;
        if gap < min_gap {
            mask[pair[0].offset..pair[1].onset].fill(1);
        }
    }
}

/// Drops saccades shorter than `min_len` samples.
pub fn remove_short(mask: &mut [u8], min_len: usize) {
    for run in saccade_runs(mask) {
        if run.len() < min_len {
            mask[run.onset..run.offset].fill(0);
        }
    }
}

/// Unlabels missing position samples. Runs before merging, so only dropouts
/// shorter than the merge distance end up inside a saccade.
pub fn clear_missing(mask: &mut [u8], x: &[f64], y: Option<&[f64]>) {
    for (i, label) in mask.iter_mut().enumerate() {
        let missing = !x[i].is_finite() || y.is_some_and(|y| !y[i].is_finite());
        if missing {
            *label = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_close() {
        let mut mask = vec![1, 1, 0, 0, 1, 1, 0, 0, 0, 0, 1];
        merge_close(&mut mask, 3);
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_merge_leaves_edges() {
        let mut mask = vec![0, 0, 1, 0, 0];
        merge_close(&mut mask, 10);
        assert_eq!(mask, vec![0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_remove_short() {
        let mut mask = vec![1, 0, 1, 1, 1, 0, 1, 1];
        remove_short(&mut mask, 3);
        assert_eq!(mask, vec![0, 0, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_clear_missing() {
        let mut mask = vec![1, 1, 1];
        clear_missing(&mut mask, &[0.0, f64::NAN, 1.0], Some(&[0.0, 0.0, f64::INFINITY]));
        assert_eq!(mask, vec![1, 0, 0]);
    }
}
