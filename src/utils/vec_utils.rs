/// Missing for fill purposes: absent, or coerced to NaN at parse time.
#[inline]
fn is_missing(value: &Option<f64>) -> bool {
    value.is_none_or(|v| v.is_nan())
}

pub fn count_pct_missing_elements(vec: &[Option<f64>]) -> f64 {
    if vec.is_empty() {
        return 0.0;
    }
    let missing = vec.iter().filter(|v| is_missing(v)).count();
    missing as f64 * 100.0 / vec.len() as f64
}

/// Replace each missing value with the most recent usable value before it.
/// Leading missing values stay as they are. Returns how many slots were filled.
pub fn fill_forward_mut(vec: &mut [Option<f64>]) -> u32 {
    let mut last_seen: Option<f64> = None;
    let mut filled = 0;
    for slot in vec.iter_mut() {
        if is_missing(slot) {
            if let Some(value) = last_seen {
                *slot = Some(value);
                filled += 1;
            }
        } else {
            last_seen = *slot;
        }
    }
    filled
}
