use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Lowest zoom level the editor accepts
pub const MIN_ZOOM: i32 = 12;

/// Highest zoom level the editor accepts
pub const MAX_ZOOM: i32 = 22;

/// Offset between the legacy editor/live-map zoom scale and the current one
pub const LEGACY_ZOOM_OFFSET: i64 = 12;

/// Clamp a raw zoom value into the editor's valid range
pub fn clamp_zoom(raw: i64) -> i32 {
    raw.clamp(MIN_ZOOM as i64, MAX_ZOOM as i64) as i32
}

/// A WGS84 point as returned by external lookup services
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Both coordinates are finite and inside the WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Where to move the viewport. Zoom is always stored clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRef {
    pub lon: f64,
    pub lat: f64,
    pub zoom: Option<i32>,
}

impl LocationRef {
    /// Build a location, clamping the zoom into `[MIN_ZOOM, MAX_ZOOM]`
    pub fn new(lon: f64, lat: f64, zoom: Option<i64>) -> Self {
        Self {
            lon,
            lat,
            zoom: zoom.map(clamp_zoom),
        }
    }

    pub fn from_point(point: GeoPoint, zoom: Option<i64>) -> Self {
        Self::new(point.lon, point.lat, zoom)
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lon, self.lat)
    }
}

/// Kinds of editable map objects the selection subsystem understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    Segment,
    Venue,
    MapComment,
    MapUpdateRequest,
    MapProblem,
    PermanentHazard,
    SegmentSuggestion,
}

impl ObjectKind {
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Segment => "segment",
            ObjectKind::Venue => "venue",
            ObjectKind::MapComment => "mapComment",
            ObjectKind::MapUpdateRequest => "mapUpdateRequest",
            ObjectKind::MapProblem => "mapProblem",
            ObjectKind::PermanentHazard => "permanentHazard",
            ObjectKind::SegmentSuggestion => "segmentSuggestion",
        }
    }

    /// Layer that has to be visible for objects of this kind to be selectable
    pub fn layer(self) -> LayerKey {
        match self {
            ObjectKind::Segment => LayerKey::Roads,
            ObjectKind::Venue => LayerKey::Places,
            ObjectKind::MapComment => LayerKey::MapComments,
            ObjectKind::MapUpdateRequest => LayerKey::UpdateRequests,
            ObjectKind::MapProblem => LayerKey::MapProblems,
            ObjectKind::PermanentHazard => LayerKey::PermanentHazards,
            ObjectKind::SegmentSuggestion => LayerKey::SegmentSuggestions,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host layer-visibility toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKey {
    Roads,
    Places,
    MapComments,
    UpdateRequests,
    MapProblems,
    PermanentHazards,
    SegmentSuggestions,
}

/// Object identifier: numeric for segments, dotted strings for venues and comments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ObjectId {
    Num(u64),
    Text(String),
}

impl ObjectId {
    /// Parse an id, preferring the numeric form when the text is all digits
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(n) => ObjectId::Num(n),
            Err(_) => ObjectId::Text(trimmed.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // "111" and 111 must compare equal once loaded
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => ObjectId::Num(n),
            Raw::Text(s) => ObjectId::parse(&s),
        })
    }
}

impl From<u64> for ObjectId {
    fn from(n: u64) -> Self {
        ObjectId::Num(n)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId::parse(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Num(n) => write!(f, "{}", n),
            ObjectId::Text(s) => f.write_str(s),
        }
    }
}

/// A homogeneous selection request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDirective {
    pub kind: ObjectKind,
    pub ids: Vec<ObjectId>,
}

impl SelectionDirective {
    pub fn new(kind: ObjectKind, ids: Vec<ObjectId>) -> Self {
        Self { kind, ids }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// What a completed resolution handed to the sink
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    pub location: Option<LocationRef>,
    pub selections: Vec<SelectionDirective>,
    /// The input field was cleared afterwards
    pub consumed: bool,
}

impl ParseResult {
    pub fn location(location: LocationRef) -> Self {
        Self {
            location: Some(location),
            selections: Vec::new(),
            consumed: true,
        }
    }

    pub fn selection(directive: SelectionDirective) -> Self {
        Self {
            location: None,
            selections: vec![directive],
            consumed: true,
        }
    }
}
