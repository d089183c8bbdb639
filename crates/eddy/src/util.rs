//! Small numeric helpers shared by the stages.

use std::cmp::Ordering;

/// Total order for layout coordinates; NaN compares equal so sorts stay deterministic.
pub fn f64_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

/// Formats a coordinate for an SVG path: 3 fractional digits, shortest round-trip text, `0` for
/// non-finite values and negative zero.
pub fn fmt_coord(v: f64, buf: &mut ryu_js::Buffer) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 {
        r = 0.0;
    }
    buf.format_finite(r).to_string()
}
