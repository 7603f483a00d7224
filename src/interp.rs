use crate::types::Value;

// Return the interpolation factor t of `v` inside [lo, hi]
pub fn find_t(lo: Value, hi: Value, v: Value) -> Value {
    (v - lo) / (hi - lo)
}

// Linear interpolation
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

// `n` evenly spaced values covering [a, b], both endpoints exact
pub fn linspace(a: Value, b: Value, n: usize) -> Vec<Value> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let last = (n - 1) as Value;
            (0..n)
                .map(|i| if i == n - 1 { b } else { lerp(a, b, i as Value / last) })
                .collect()
        }
    }
}
