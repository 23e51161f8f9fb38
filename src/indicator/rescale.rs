use tracing::warn;

use crate::model::Series;

/// Smallest and largest defined value, if any.
pub fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Min-max rescale `values` into the observed range of `reference`.
///
/// A source series whose defined values are all equal maps to a constant
/// series at the reference minimum. Undefined points stay undefined; if
/// either side has no defined values the whole output is undefined.
pub fn rescale_into(values: &Series, reference: &[f64]) -> Series {
    let (Some((src_min, src_max)), Some((dst_min, dst_max))) = (
        min_max(values.iter().flatten().copied()),
        min_max(reference.iter().copied()),
    ) else {
        return vec![None; values.len()];
    };

    let src_range = src_max - src_min;
    if src_range == 0.0 {
        warn!(
            value = src_min,
            "constant series has no range to rescale, mapping to reference minimum"
        );
        return values.iter().map(|v| v.map(|_| dst_min)).collect();
    }

    let dst_range = dst_max - dst_min;
    values
        .iter()
        .map(|v| v.map(|v| (v - src_min) / src_range * dst_range + dst_min))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescaled_series_spans_reference_range() {
        let values: Series = vec![Some(-500.0), Some(250.0), Some(1000.0), Some(0.0)];
        let reference = [30_000.0, 42_000.0, 61_000.0];
        let scaled = rescale_into(&values, &reference);

        let (lo, hi) = min_max(scaled.iter().flatten().copied()).unwrap();
        assert!((lo - 30_000.0).abs() < 1e-6);
        assert!((hi - 61_000.0).abs() < 1e-6);
    }

    #[test]
    fn rescale_preserves_relative_position() {
        let values: Series = vec![Some(0.0), Some(5.0), Some(10.0)];
        let scaled = rescale_into(&values, &[100.0, 200.0]);
        assert_eq!(scaled, vec![Some(100.0), Some(150.0), Some(200.0)]);
    }

    #[test]
    fn constant_series_maps_to_reference_minimum() {
        let values: Series = vec![Some(7.0), Some(7.0), None];
        let scaled = rescale_into(&values, &[3.0, 9.0]);
        assert_eq!(scaled, vec![Some(3.0), Some(3.0), None]);
    }

    #[test]
    fn undefined_inputs_yield_undefined_output() {
        let values: Series = vec![None, None];
        assert_eq!(rescale_into(&values, &[1.0, 2.0]), vec![None, None]);
        let values: Series = vec![Some(1.0)];
        assert_eq!(rescale_into(&values, &[]), vec![None]);
    }

    #[test]
    fn min_max_of_empty_is_none() {
        assert_eq!(min_max(Vec::<f64>::new()), None);
        assert_eq!(min_max([2.0, -1.0, 5.0]), Some((-1.0, 5.0)));
    }
}
