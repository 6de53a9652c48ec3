//! Categorical string tables attached to series.

use rustc_hash::FxHashMap;

/// Distinct string values of a categorical series.
///
/// A series with a string table stores 1-based codes into it; NA marks a
/// missing value.
#[derive(Clone, Debug, Default)]
pub struct StringTable {
    strings: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for s in strings {
            table.intern(&s.into());
        }
        table
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Code for `s`, if present.
    pub fn code_of(&self, s: &str) -> Option<f64> {
        self.index.get(s).map(|&i| (i + 1) as f64)
    }

    /// String for a code. NA and out-of-range codes give `None`.
    pub fn get(&self, code: f64) -> Option<&str> {
        if !code.is_finite() || code < 1.0 || code.fract() != 0.0 {
            return None;
        }
        self.strings.get(code as usize - 1).map(String::as_str)
    }

    /// Code for `s`, adding it if missing.
    pub fn intern(&mut self, s: &str) -> f64 {
        if let Some(code) = self.code_of(s) {
            return code;
        }
        self.strings.push(s.to_owned());
        self.index.insert(s.to_owned(), self.strings.len() - 1);
        self.strings.len() as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}

impl PartialEq for StringTable {
    fn eq(&self, other: &Self) -> bool {
        self.strings == other.strings
    }
}
