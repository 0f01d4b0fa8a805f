use statrs::statistics::Statistics;

/// Number of grid ticks from `range_start` up to the last tick at or before `range_end`.
/// `range_end` itself need not sit on the grid. `None` when the span does not fit in an `i64`
/// or the range is inverted.
pub fn ticks_spanning(range_start: i64, range_end: i64, interval: i64) -> Option<usize> {
    debug_assert!(interval > 0);
    let span = range_end.checked_sub(range_start).filter(|span| *span >= 0)?;
    usize::try_from(span / interval).ok()?.checked_add(1)
}

/// Grid index of `value`, or `None` when it falls between ticks or outside the grid's range.
pub fn index_on_grid(range_start: i64, value: i64, range_interval: i64) -> Option<usize> {
    let offset = value.checked_sub(range_start)?;
    if offset < 0 || offset % range_interval != 0 {
        return None;
    }
    usize::try_from(offset / range_interval).ok()
}

/// A value that takes part in aggregate statistics: present and not NaN.
#[inline]
pub fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Mean of the usable values, `None` when there are none.
pub fn mean_of_usable(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().filter_map(|v| usable(*v)).collect();
    if present.is_empty() {
        return None;
    }
    Some(present.mean())
}

/// Sample (n - 1) standard deviation of the usable values, `None` below two samples.
pub fn sample_std_of_usable(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().filter_map(|v| usable(*v)).collect();
    if present.len() < 2 {
        return None;
    }
    Some(present.std_dev())
}

/// Pearson correlation of two equally long samples.
/// NaN below two samples or when either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.len() < 2 {
        return f64::NAN;
    }
    let sd_x = xs.std_dev();
    let sd_y = ys.std_dev();
    if sd_x == 0.0 || sd_y == 0.0 {
        return f64::NAN;
    }
    let cov = xs.covariance(ys);
    (cov / (sd_x * sd_y)).clamp(-1.0, 1.0)
}
