//! Pointwise series transforms. Each preserves the input tag set and
//! timerange; NaN discipline is deliberately inconsistent across transforms
//! and must not be unified.

use crate::series::Timeseries;

fn scale_seconds(resolution_ms: i64) -> f64 {
    resolution_ms as f64 / 1_000.0
}

/// `[i] = (v[i] - v[i-1]) / scale`, `[0] = 0`. Any NaN operand yields NaN.
pub fn derivative(series: &Timeseries, resolution_ms: i64) -> Timeseries {
    let scale = scale_seconds(resolution_ms);
    let mut values = Vec::with_capacity(series.values.len());
    for (i, &v) in series.values.iter().enumerate() {
        if i == 0 {
            values.push(0.0);
        } else {
            values.push((v - series.values[i - 1]) / scale);
        }
    }
    Timeseries::new(values, series.tag_set.clone())
}

/// `derivative`, clamped to `max(result, 0)`. NaN stays NaN (`f64::max` with
/// a NaN operand returns the other operand, so NaN inputs must be special-cased).
pub fn rate(series: &Timeseries, resolution_ms: i64) -> Timeseries {
    let mut derived = derivative(series, resolution_ms);
    for v in &mut derived.values {
        if !v.is_nan() {
            *v = v.max(0.0);
        }
    }
    derived
}

/// `[i] = (sum of non-NaN v[0..=i]) * scale`. NaN contributes 0 to the
/// running sum but the output itself is never NaN.
pub fn integral(series: &Timeseries, resolution_ms: i64) -> Timeseries {
    let scale = scale_seconds(resolution_ms);
    let mut running = 0.0;
    let values = series
        .values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                running += v;
            }
            running * scale
        })
        .collect();
    Timeseries::new(values, series.tag_set.clone())
}

/// `integral` without the `* scale` factor.
pub fn cumulative(series: &Timeseries) -> Timeseries {
    let mut running = 0.0;
    let values = series
        .values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                running += v;
            }
            running
        })
        .collect();
    Timeseries::new(values, series.tag_set.clone())
}

/// Replace NaN with a fixed default.
pub fn default(series: &Timeseries, d: f64) -> Timeseries {
    let values = series.values.iter().map(|&v| if v.is_nan() { d } else { v }).collect();
    Timeseries::new(values, series.tag_set.clone())
}

/// Replace NaN with the previous non-NaN value. Leading NaNs stay NaN.
pub fn keep_last(series: &Timeseries) -> Timeseries {
    let mut last: Option<f64> = None;
    let values = series
        .values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                last.unwrap_or(f64::NAN)
            } else {
                last = Some(v);
                v
            }
        })
        .collect();
    Timeseries::new(values, series.tag_set.clone())
}

/// Elementwise `f`, including on NaN: `f(NaN)` is whatever the caller's
/// function returns for it.
pub fn map(series: &Timeseries, f: impl Fn(f64) -> f64) -> Timeseries {
    let values = series.values.iter().map(|&v| f(v)).collect();
    Timeseries::new(values, series.tag_set.clone())
}
