//! Series identifiers and the list-of-series value.

use std::fmt;

/// Index of a series in the dataset. Id 0 is the constant series.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct SeriesId(u32);

impl SeriesId {
    /// The constant series `const`.
    pub const CONST: SeriesId = SeriesId(0);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Build an id from a position in series storage.
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeriesId({})", self.0)
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered sequence of series ids. Indexing at the script level is 1-based.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct List {
    ids: Vec<SeriesId>,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: Vec<SeriesId>) -> Self {
        Self { ids }
    }

    #[inline]
    pub fn ids(&self) -> &[SeriesId] {
        &self.ids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: SeriesId) -> bool {
        self.ids.contains(&id)
    }

    pub fn push(&mut self, id: SeriesId) {
        self.ids.push(id);
    }

    /// Replace the element at a 0-based position.
    pub fn set(&mut self, pos: usize, id: SeriesId) -> bool {
        match self.ids.get_mut(pos) {
            Some(slot) => {
                *slot = id;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Append all of `other`, keeping duplicates.
    pub fn append(&mut self, other: &List) {
        self.ids.extend_from_slice(&other.ids);
    }

    /// Ids of `self` followed by ids of `other` not already present.
    pub fn union(&self, other: &List) -> List {
        let mut out = self.clone();
        for &id in &other.ids {
            if !out.contains(id) {
                out.ids.push(id);
            }
        }
        out
    }

    /// Ids of `self` that also appear in `other`, in `self` order.
    pub fn intersect(&self, other: &List) -> List {
        List::from_ids(
            self.ids
                .iter()
                .copied()
                .filter(|&id| other.contains(id))
                .collect(),
        )
    }

    /// Ids of `self` that do not appear in `other`.
    pub fn difference(&self, other: &List) -> List {
        List::from_ids(
            self.ids
                .iter()
                .copied()
                .filter(|&id| !other.contains(id))
                .collect(),
        )
    }
}

impl FromIterator<SeriesId> for List {
    fn from_iter<I: IntoIterator<Item = SeriesId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
