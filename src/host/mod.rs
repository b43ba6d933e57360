//! Capability interfaces over the host map editor.
//!
//! The resolver and highlight engine never touch the editor directly. They
//! ask a [`DataModel`] about loaded objects, push commands into a [`Sink`],
//! and read on-screen snapshots through a [`HighlightHost`].
//!
//! [`RecordingHost`] implements all three from a JSON description and records
//! every command as an [`Effect`].

pub mod recording;

pub use recording::{HostState, RecordingHost};

use crate::highlight::OverlayFeature;
use crate::types::{LayerKey, LocationRef, ObjectId, ObjectKind, SelectionDirective};
use serde::{Deserialize, Serialize};

/// Read access to the host's in-memory object model
pub trait DataModel {
    /// Whether an object of this kind and id is loaded
    fn contains(&self, kind: ObjectKind, id: &ObjectId) -> bool;

    /// Map-data region the user is editing (e.g. `usa`)
    fn region_code(&self) -> String;

    /// Block until the host reports its model ready after a viewport change
    fn await_model_ready(&self);

    /// Whether the host is still fetching data for the current viewport
    fn is_loading(&self) -> bool;
}

/// Commands the core issues to the host
pub trait Sink {
    fn set_viewport(&mut self, location: &LocationRef);

    fn set_selection(&mut self, directive: &SelectionDirective);

    fn show_problem_detail(&mut self, id: &ObjectId);

    fn ensure_layer_visible(&mut self, layer: LayerKey);

    /// User-visible notice (alert)
    fn notify_user(&mut self, message: &str);

    /// Empty the search box
    fn clear_input(&mut self);
}

/// Host side of the live highlight: snapshots in, overlay and badge out
pub trait HighlightHost {
    /// Objects currently intersecting the viewport, fetched fresh on every call
    fn snapshot(&self) -> OnScreenSnapshot;

    fn subscribe_viewport(&mut self);

    fn unsubscribe_viewport(&mut self);

    /// Replace every overlay feature with `features`
    fn render_overlay(&mut self, features: &[OverlayFeature]);

    fn clear_overlay(&mut self);

    /// Show or update the roads/places count badge
    fn show_counts(&mut self, roads: usize, places: usize);

    fn remove_counts(&mut self);
}

/// A road segment as seen on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentView {
    pub id: ObjectId,
    #[serde(default)]
    pub primary_street: Option<String>,
    #[serde(default)]
    pub alt_streets: Vec<String>,
    #[serde(default)]
    pub geometry: Vec<[f64; 2]>,
}

/// A place as seen on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueView {
    pub id: ObjectId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub geometry: Vec<[f64; 2]>,
}

/// Ordered, read-only view of the on-screen objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnScreenSnapshot {
    #[serde(default)]
    pub segments: Vec<SegmentView>,
    #[serde(default)]
    pub venues: Vec<VenueView>,
}

/// One command issued to the host, as recorded by [`RecordingHost`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    SetViewport {
        lon: f64,
        lat: f64,
        zoom: Option<i32>,
    },
    SetSelection {
        kind: ObjectKind,
        ids: Vec<ObjectId>,
    },
    ShowProblemDetail {
        id: ObjectId,
    },
    EnsureLayerVisible {
        layer: LayerKey,
    },
    NotifyUser {
        message: String,
    },
    ClearInput,
    SubscribeViewport,
    UnsubscribeViewport,
    RenderOverlay {
        features: usize,
    },
    ClearOverlay,
    ShowCounts {
        roads: usize,
        places: usize,
    },
    RemoveCounts,
}
