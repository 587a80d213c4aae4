/// Quantile of a set of values, the mean of the two order statistics
/// around `(n - 1) * q`.
///
/// `q` is clamped to [0, 1]. The slice is sorted in place, callers that
/// need the original order should pass a copy.
///
/// Empty inputs give 0.
pub fn calc_quantile_in_place(values: &mut [f64], q: f64) -> f64 {
    match values.len() {
        0 => return 0.0,
        1 => return values[0],
        _ => {}
    }
    let q = q.clamp(0.0, 1.0);
    values.sort_unstable_by(|a, b| a.total_cmp(b));

    let pos = (values.len() - 1) as f64 * q;
    let ind1 = pos.floor() as usize;
    let ind2 = pos.ceil() as usize;
    (values[ind1] + values[ind2]) / 2.0
}

pub fn calc_quantile(values: &[f64], q: f64) -> f64 {
    let mut tmp = values.to_vec();
    calc_quantile_in_place(&mut tmp, q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile() {
        let vals = [40.0, 20.0, 25.0];
        assert_eq!(calc_quantile(&vals, 0.0), 20.0);
        assert_eq!(calc_quantile(&vals, 0.5), 25.0);
        assert_eq!(calc_quantile(&vals, 1.0), 40.0);
        // (n - 1) * 0.25 = 0.5 -> mean of the first two
        assert_eq!(calc_quantile(&vals, 0.25), 22.5);
        // Clamped
        assert_eq!(calc_quantile(&vals, 2.0), 40.0);
    }

    #[test]
    fn test_quantile_degenerate() {
        assert_eq!(calc_quantile(&[], 0.5), 0.0);
        assert_eq!(calc_quantile(&[7.0], 0.9), 7.0);
    }

    #[test]
    fn test_quantile_in_place_sorts() {
        let mut vals = vec![3.0, 1.0, 2.0, 4.0];
        let q = calc_quantile_in_place(&mut vals, 0.5);
        assert_eq!(q, 2.5);
        assert_eq!(vals, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
