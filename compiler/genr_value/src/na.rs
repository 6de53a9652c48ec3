//! Missing-value ("NA") encoding.
//!
//! NA is stored as IEEE NaN, so it propagates through ordinary float
//! arithmetic. Code that needs to tell NA apart from a real number goes
//! through these helpers rather than comparing with `==`.

/// The NA marker.
pub const NA: f64 = f64::NAN;

#[inline]
pub fn is_na(x: f64) -> bool {
    x.is_nan()
}

/// Truth value of a number, `None` for NA.
#[inline]
pub fn truth(x: f64) -> Option<bool> {
    if x.is_nan() {
        None
    } else {
        Some(x != 0.0)
    }
}

/// Boolean as 0/1.
#[inline]
pub fn from_bool(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Equality that treats two NAs as equal.
#[inline]
pub fn na_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

/// Slice equality with [`na_eq`] per element.
pub fn slices_na_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| na_eq(x, y))
}
