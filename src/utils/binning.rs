/// Bins a spectrum into `num_bins` equal-width bins between `min_mz` and
/// `max_mz`, keeping the maximum intensity of every bin.
///
/// A point exactly on `max_mz` lands in the last bin. Points outside the
/// range are not binned, but the closest one on each side is used as an
/// anchor for the interpolation.
///
/// When `interpolate` is set, empty bins get a value linearly interpolated
/// between the closest non-empty bins on each side. Past the last
/// non-empty bin, the outside point on that side is the other end of the
/// line; with no outside point the value is carried flat to the edge.
/// Without interpolation, empty bins are 0.
///
/// # Example
/// ```
/// use peakpicker::utils::binning::bin_max_intensities;
///
/// let mzs = [100.0, 100.2, 100.9];
/// let ints = [10.0, 30.0, 60.0];
/// let out = bin_max_intensities(&mzs, &ints, 100.0, 101.0, 5, true);
/// // bins: [100.0, 100.2) [100.2, 100.4) [100.4, 100.6) [100.6, 100.8) [100.8, 101.0]
/// assert_eq!(out, vec![10.0, 30.0, 40.0, 50.0, 60.0]);
/// ```
pub fn bin_max_intensities(
    mz: &[f64],
    intensity: &[f64],
    min_mz: f64,
    max_mz: f64,
    num_bins: usize,
    interpolate: bool,
) -> Vec<f64> {
    assert_eq!(mz.len(), intensity.len(), "Arrays must have the same length");
    if num_bins == 0 {
        return Vec::new();
    }

    let bin_width = (max_mz - min_mz) / num_bins as f64;
    let mut bins: Vec<Option<f64>> = vec![None; num_bins];

    // Closest points outside of the range (x, y)
    let mut before: Option<(f64, f64)> = None;
    let mut after: Option<(f64, f64)> = None;

    for (&x, &y) in mz.iter().zip(intensity.iter()) {
        if x < min_mz {
            if before.map_or(true, |(bx, _)| x > bx) {
                before = Some((x, y));
            }
            continue;
        }
        if x > max_mz {
            if after.map_or(true, |(ax, _)| x < ax) {
                after = Some((x, y));
            }
            continue;
        }

        let bin_index = if bin_width > 0.0 {
            (((x - min_mz) / bin_width) as usize).min(num_bins - 1)
        } else {
            0
        };

        let slot = &mut bins[bin_index];
        *slot = Some(match *slot {
            Some(curr) if curr >= y => curr,
            _ => y,
        });
    }

    if !interpolate {
        return bins.into_iter().map(|x| x.unwrap_or(0.0)).collect();
    }

    let first_value = bins.iter().find_map(|x| *x);
    let last_value = bins.iter().rev().find_map(|x| *x);

    // Anchors outside of the range, as (bin position, value).
    let left_anchor = match before {
        Some((bx, by)) if bin_width > 0.0 => (((bx - min_mz) / bin_width).floor(), by),
        _ => (
            -1.0,
            first_value
                .or(after.map(|(_, ay)| ay))
                .unwrap_or(0.0),
        ),
    };
    let right_anchor = match after {
        Some((ax, ay)) if bin_width > 0.0 => (
            (num_bins - 1) as f64 + ((ax - max_mz) / bin_width).ceil().max(1.0),
            ay,
        ),
        _ => (
            num_bins as f64,
            last_value
                .or(before.map(|(_, by)| by))
                .unwrap_or(0.0),
        ),
    };

    let mut out = vec![0.0; num_bins];
    let mut last_filled = left_anchor;
    let mut gap_start = 0;
    for i in 0..=num_bins {
        let next_filled = if i == num_bins {
            Some(right_anchor)
        } else {
            bins[i].map(|v| (i as f64, v))
        };

        let Some((next_pos, next_val)) = next_filled else {
            continue;
        };

        // Fill the empty bins between the two anchors
        let (last_pos, last_val) = last_filled;
        let slope = (next_val - last_val) / (next_pos - last_pos);
        for (j, slot) in out.iter_mut().enumerate().take(i).skip(gap_start) {
            *slot = last_val + slope * (j as f64 - last_pos);
        }

        if i < num_bins {
            out[i] = next_val;
            last_filled = (next_pos, next_val);
            gap_start = i + 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_binning() {
        let mzs = [100.0, 100.05, 100.3, 101.0];
        let ints = [5.0, 8.0, 2.0, 7.0];
        let out = bin_max_intensities(&mzs, &ints, 100.0, 101.0, 2, false);
        assert_eq!(out, vec![8.0, 7.0]);
    }

    #[test]
    fn test_empty_bins_without_interpolation() {
        let out = bin_max_intensities(&[100.0], &[3.0], 100.0, 101.0, 4, false);
        assert_eq!(out, vec![3.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_edges_without_outside_points_are_flat() {
        // Single point in bin 1 of 4, nothing outside the range
        let out = bin_max_intensities(&[100.3], &[20.0], 100.0, 101.0, 4, true);
        assert_eq!(out, vec![20.0, 20.0, 20.0, 20.0]);

        let out = bin_max_intensities(&[100.1, 100.9], &[10.0, 30.0], 100.0, 101.0, 4, true);
        assert_eq!(out[0], 10.0);
        assert_eq!(out[3], 30.0);
        assert!((out[1] - 50.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_towards_outside_points() {
        // Outside points one bin before and one bin after the range
        let out = bin_max_intensities(
            &[99.75, 100.3, 101.2],
            &[0.0, 20.0, 0.0],
            100.0,
            101.0,
            4,
            true,
        );
        assert_eq!(out[1], 20.0);
        assert!((out[0] - 10.0).abs() < 1e-9);
        // Right anchor is at position 4
        assert!((out[2] - 40.0 / 3.0).abs() < 1e-9);
        assert!((out[3] - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_outside_points() {
        let out = bin_max_intensities(&[99.0], &[8.0], 100.0, 101.0, 2, true);
        assert_eq!(out, vec![8.0, 8.0]);
    }

    #[test]
    fn test_empty_scan_gives_zeros() {
        let out = bin_max_intensities(&[], &[], 100.0, 101.0, 3, true);
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_width_range() {
        let out = bin_max_intensities(&[100.0, 100.0], &[4.0, 9.0], 100.0, 100.0, 1, true);
        assert_eq!(out, vec![9.0]);
    }
}
