//! In-memory dataset: series storage, sample range and structure.

use rustc_hash::FxHashMap;

use genr_value::{SeriesId, StringTable, NA};

use crate::error::DataError;
use crate::is_valid_name;

/// How observations are organised.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Structure {
    /// Unordered observations, labelled `1..n`.
    CrossSection,
    /// Dated observations with `pd` periods per year starting at `start`.
    TimeSeries { pd: u32, start: i32 },
    /// Stacked time series: `units` blocks of `periods` observations each.
    Panel { units: usize, periods: usize },
}

/// One series.
#[derive(Clone, Debug)]
pub struct SeriesData {
    pub name: String,
    pub values: Vec<f64>,
    /// Present for categorical series, whose values are 1-based codes.
    pub strings: Option<StringTable>,
}

impl SeriesData {
    pub fn is_categorical(&self) -> bool {
        self.strings.is_some()
    }
}

/// Series storage addressed by [`SeriesId`]. Id 0 is the constant `const`.
#[derive(Clone, Debug)]
pub struct Dataset {
    nobs: usize,
    t1: usize,
    t2: usize,
    structure: Structure,
    series: Vec<SeriesData>,
    index: FxHashMap<String, SeriesId>,
    markers: Option<Vec<String>>,
    epoch: u64,
    modified: bool,
}

impl Dataset {
    /// Cross-sectional dataset of `nobs` observations holding only `const`.
    pub fn new(nobs: usize) -> Self {
        let mut ds = Self {
            nobs,
            t1: 0,
            t2: nobs.saturating_sub(1),
            structure: Structure::CrossSection,
            series: Vec::new(),
            index: FxHashMap::default(),
            markers: None,
            epoch: 0,
            modified: false,
        };
        ds.series.push(SeriesData {
            name: "const".to_owned(),
            values: vec![1.0; nobs],
            strings: None,
        });
        ds.index.insert("const".to_owned(), SeriesId::CONST);
        ds
    }

    pub fn with_structure(nobs: usize, structure: Structure) -> Result<Self, DataError> {
        let mut ds = Self::new(nobs);
        ds.set_obs(structure)?;
        Ok(ds)
    }

    #[inline]
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Active sample, 0-based inclusive.
    #[inline]
    pub fn sample(&self) -> (usize, usize) {
        (self.t1, self.t2)
    }

    /// Number of observations in the active sample.
    pub fn sample_len(&self) -> usize {
        if self.nobs == 0 {
            0
        } else {
            self.t2 - self.t1 + 1
        }
    }

    pub fn set_sample(&mut self, t1: usize, t2: usize) -> Result<(), DataError> {
        if t1 > t2 || t2 >= self.nobs {
            return Err(DataError::BadSample {
                t1,
                t2,
                nobs: self.nobs,
            });
        }
        self.t1 = t1;
        self.t2 = t2;
        Ok(())
    }

    pub fn full_sample(&mut self) {
        self.t1 = 0;
        self.t2 = self.nobs.saturating_sub(1);
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    /// Set the observation structure.
    pub fn set_obs(&mut self, structure: Structure) -> Result<(), DataError> {
        match structure {
            Structure::Panel { units, periods } if units * periods != self.nobs => {
                return Err(DataError::BadStructure {
                    message: format!(
                        "{units} units x {periods} periods != {} observations",
                        self.nobs
                    ),
                });
            }
            Structure::TimeSeries { pd: 0, .. } => {
                return Err(DataError::BadStructure {
                    message: "frequency must be positive".to_owned(),
                });
            }
            _ => {}
        }
        self.structure = structure;
        Ok(())
    }

    /// Change the number of observations. New rows are NA (1 for `const`);
    /// the sample is reset to the full range.
    pub fn resize(&mut self, nobs: usize) -> Result<(), DataError> {
        if let Structure::Panel { .. } = self.structure {
            return Err(DataError::BadStructure {
                message: "cannot resize a panel dataset".to_owned(),
            });
        }
        for (i, s) in self.series.iter_mut().enumerate() {
            let fill = if i == 0 { 1.0 } else { NA };
            s.values.resize(nobs, fill);
        }
        if let Some(markers) = &mut self.markers {
            let old = markers.len();
            markers.resize_with(nobs, String::new);
            for (t, m) in markers.iter_mut().enumerate().skip(old) {
                *m = (t + 1).to_string();
            }
        }
        self.nobs = nobs;
        self.full_sample();
        self.bump();
        tracing::debug!(nobs, epoch = self.epoch, "dataset resized");
        Ok(())
    }

    /// Number of series, including `const`.
    pub fn num_series(&self) -> usize {
        self.series.len()
    }

    /// Append a series; `values` must have `nobs` entries.
    pub fn add_series(&mut self, name: &str, values: Vec<f64>) -> Result<SeriesId, DataError> {
        if !is_valid_name(name) {
            return Err(DataError::InvalidName {
                name: name.to_owned(),
            });
        }
        if self.index.contains_key(name) {
            return Err(DataError::DuplicateName {
                name: name.to_owned(),
            });
        }
        if values.len() != self.nobs {
            return Err(DataError::LengthMismatch {
                expected: self.nobs,
                got: values.len(),
            });
        }
        let id = SeriesId::from_index(self.series.len()).ok_or_else(|| {
            DataError::BadStructure {
                message: "too many series".to_owned(),
            }
        })?;
        self.series.push(SeriesData {
            name: name.to_owned(),
            values,
            strings: None,
        });
        self.index.insert(name.to_owned(), id);
        self.modified = true;
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<SeriesId> {
        self.index.get(name).copied()
    }

    pub fn series(&self, id: SeriesId) -> Option<&SeriesData> {
        self.series.get(id.index())
    }

    /// Mutable access for writing values; marks the dataset modified.
    /// The constant series is not writable.
    pub fn series_mut(&mut self, id: SeriesId) -> Result<&mut SeriesData, DataError> {
        if id == SeriesId::CONST {
            return Err(DataError::ConstSeries);
        }
        let s = self
            .series
            .get_mut(id.index())
            .ok_or_else(|| DataError::UnknownSeries {
                name: id.to_string(),
            })?;
        self.modified = true;
        Ok(s)
    }

    pub fn values(&self, id: SeriesId) -> Option<&[f64]> {
        self.series(id).map(|s| s.values.as_slice())
    }

    pub fn name_of(&self, id: SeriesId) -> Option<&str> {
        self.series(id).map(|s| s.name.as_str())
    }

    pub fn rename_series(&mut self, id: SeriesId, new_name: &str) -> Result<(), DataError> {
        if id == SeriesId::CONST {
            return Err(DataError::ConstSeries);
        }
        if !is_valid_name(new_name) {
            return Err(DataError::InvalidName {
                name: new_name.to_owned(),
            });
        }
        if self.index.contains_key(new_name) {
            return Err(DataError::DuplicateName {
                name: new_name.to_owned(),
            });
        }
        let s = self
            .series
            .get_mut(id.index())
            .ok_or_else(|| DataError::UnknownSeries {
                name: id.to_string(),
            })?;
        self.index.remove(&s.name);
        s.name = new_name.to_owned();
        self.index.insert(new_name.to_owned(), id);
        self.bump();
        tracing::debug!(series = new_name, epoch = self.epoch, "series renamed");
        Ok(())
    }

    /// Remove a series. Ids above it shift down by one.
    pub fn delete_series(&mut self, id: SeriesId) -> Result<SeriesData, DataError> {
        if id == SeriesId::CONST {
            return Err(DataError::ConstSeries);
        }
        if id.index() >= self.series.len() {
            return Err(DataError::UnknownSeries {
                name: id.to_string(),
            });
        }
        let removed = self.series.remove(id.index());
        self.index.clear();
        for (i, s) in self.series.iter().enumerate() {
            if let Some(sid) = SeriesId::from_index(i) {
                self.index.insert(s.name.clone(), sid);
            }
        }
        self.bump();
        tracing::debug!(series = %removed.name, epoch = self.epoch, "series deleted");
        Ok(removed)
    }

    pub fn set_string_table(
        &mut self,
        id: SeriesId,
        table: Option<StringTable>,
    ) -> Result<(), DataError> {
        self.series_mut(id)?.strings = table;
        Ok(())
    }

    /// Install observation markers (one label per observation).
    pub fn set_markers(&mut self, markers: Vec<String>) -> Result<(), DataError> {
        if markers.len() != self.nobs {
            return Err(DataError::LengthMismatch {
                expected: self.nobs,
                got: markers.len(),
            });
        }
        self.markers = Some(markers);
        Ok(())
    }

    pub fn has_markers(&self) -> bool {
        self.markers.is_some()
    }

    /// Label of observation `t` (0-based).
    pub fn obs_label(&self, t: usize) -> String {
        if let Some(m) = self.markers.as_ref().and_then(|m| m.get(t)) {
            return m.clone();
        }
        match self.structure {
            Structure::CrossSection => (t + 1).to_string(),
            Structure::TimeSeries { pd, start } => {
                let pd = pd as usize;
                let year = i64::from(start) + (t / pd) as i64;
                let sub = t % pd + 1;
                match pd {
                    1 => year.to_string(),
                    2..=9 => format!("{year}:{sub}"),
                    _ => format!("{year}:{sub:02}"),
                }
            }
            Structure::Panel { periods, .. } => {
                format!("{}:{}", t / periods + 1, t % periods + 1)
            }
        }
    }

    /// Observation whose label is `label`.
    pub fn find_obs(&self, label: &str) -> Option<usize> {
        if let Some(markers) = &self.markers {
            if let Some(t) = markers.iter().position(|m| m == label) {
                return Some(t);
            }
        }
        (0..self.nobs).find(|&t| self.obs_label(t) == label)
    }

    /// Source row for reading observation `t` shifted by `offset`
    /// (`x(-1)` reads row `t - 1`). `None` when the source falls outside the
    /// data or, for panels, in a different unit.
    pub fn lag_source(&self, t: usize, offset: i64) -> Option<usize> {
        let src = i64::try_from(t).ok()?.checked_add(offset)?;
        let src = usize::try_from(src).ok()?;
        if src >= self.nobs {
            return None;
        }
        if let Structure::Panel { periods, .. } = self.structure {
            if periods == 0 || src / periods != t / periods {
                return None;
            }
        }
        Some(src)
    }

    /// Identity counter; changes when series ids or the row count change.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    fn bump(&mut self) {
        self.epoch += 1;
        self.modified = true;
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
