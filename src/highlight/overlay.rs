use crate::types::{ObjectId, ObjectKind};
use serde::Serialize;

/// One highlighted object on the overlay layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayFeature {
    pub kind: ObjectKind,
    pub id: ObjectId,
    /// The name that matched
    pub label: String,
    pub geometry: Vec<[f64; 2]>,
}

/// Render layer contents. Updates always replace every feature.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    features: Vec<OverlayFeature>,
}

impl Overlay {
    pub fn replace(&mut self, features: Vec<OverlayFeature>) {
        self.features = features;
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }

    pub fn features(&self) -> &[OverlayFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
