use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_FILTER_COUNT, DEFAULT_MASKS_DIR};

/// One selectable overlay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: String,
    pub name: String,
    /// Path relative to the masks directory, absolute path, or http(s) URL.
    pub asset: String,
    /// Cover the whole frame instead of following the face.
    #[serde(default)]
    pub full_frame: bool,
}

impl Filter {
    pub fn face_mask(id: impl Into<String>, name: impl Into<String>, asset: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset: asset.into(),
            full_frame: false,
        }
    }
}

/// The filters offered for a session, in display order.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterCatalog {
    filters: Vec<Filter>,
}

impl FilterCatalog {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// Built-in masks `"0"`..`"14"` at `masks/<id>.png`.
    pub fn default_masks() -> Self {
        Self::new(
            (0..DEFAULT_FILTER_COUNT)
                .map(|i| {
                    Filter::face_mask(
                        i.to_string(),
                        format!("Mask {}", i + 1),
                        format!("{DEFAULT_MASKS_DIR}/{i}.png"),
                    )
                })
                .collect(),
        )
    }

    /// Appends filters, replacing any built-in with the same id.
    pub fn with_extra(mut self, extra: impl IntoIterator<Item = Filter>) -> Self {
        for filter in extra {
            match self.filters.iter_mut().find(|f| f.id == filter.id) {
                Some(existing) => *existing = filter,
                None => self.filters.push(filter),
            }
        }
        self
    }

    /// Exact id first, then the id with `-` separators removed
    /// (`"mask-3"` finds `"mask3"`).
    pub fn get(&self, id: &str) -> Option<&Filter> {
        self.filters
            .iter()
            .find(|f| f.id == id)
            .or_else(|| {
                let compact = id.replace('-', "");
                self.filters.iter().find(|f| f.id == compact)
            })
    }

    pub fn first(&self) -> Option<&Filter> {
        self.filters.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::default_masks()
    }
}
