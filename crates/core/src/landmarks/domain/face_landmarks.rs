//! Face Mesh landmarks as delivered by the external detector.
//!
//! Coordinates are normalized to [0, 1] in the unmirrored camera image.
//! Indices follow the detector's 468/478-point mesh numbering; only a handful
//! of them are consumed here.

/// Mesh indices consumed by the geometry resolver.
pub mod indices {
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const NOSE_TIP: usize = 1;
    pub const CHIN: usize = 152;
    pub const FOREHEAD: usize = 10;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;

    /// Points in the refined mesh (468 face points plus 10 iris points).
    pub const MESH_SIZE: usize = 478;

    pub const REQUIRED: [usize; 7] = [
        LEFT_EYE_OUTER,
        RIGHT_EYE_OUTER,
        NOSE_TIP,
        CHIN,
        FOREHEAD,
        LEFT_CHEEK,
        RIGHT_CHEEK,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Flips the horizontal axis to match a selfie-mirrored feed.
    pub fn mirrored(&self) -> Self {
        Self {
            x: 1.0 - self.x,
            ..*self
        }
    }

    fn is_usable(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One face's landmark list, addressable by mesh index.
///
/// Entries may be absent: sparse recordings only carry the points they need,
/// and a landmark with non-finite coordinates counts as missing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Option<Landmark>>,
}

impl FaceLandmarks {
    /// Dense detector output: position in the vector is the mesh index.
    pub fn new(points: Vec<Landmark>) -> Self {
        Self {
            points: points.into_iter().map(Some).collect(),
        }
    }

    pub fn from_optional(points: Vec<Option<Landmark>>) -> Self {
        Self { points }
    }

    /// Indices outside the mesh are dropped.
    pub fn from_sparse(points: impl IntoIterator<Item = (usize, Landmark)>) -> Self {
        let mut dense: Vec<Option<Landmark>> = Vec::new();
        for (index, landmark) in points {
            if index >= indices::MESH_SIZE {
                continue;
            }
            if index >= dense.len() {
                dense.resize(index + 1, None);
            }
            dense[index] = Some(landmark);
        }
        Self { points: dense }
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points
            .get(index)
            .and_then(|p| p.as_ref())
            .filter(|p| p.is_usable())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(|p| p.is_none())
    }

    pub fn has_all(&self, required: &[usize]) -> bool {
        required.iter().all(|&i| self.get(i).is_some())
    }
}
