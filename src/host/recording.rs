//! JSON-described host that records every command it receives.
//!
//! Used by the CLI to resolve pastes without a running editor, and by tests
//! as the fake on the other side of every capability trait.

use super::{DataModel, Effect, HighlightHost, OnScreenSnapshot, Sink};
use crate::highlight::OverlayFeature;
use crate::types::{LayerKey, LocationRef, ObjectId, ObjectKind, SelectionDirective};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

fn default_region() -> String {
    "usa".to_string()
}

/// Initial host state, loadable from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostState {
    /// Map-data region reported to the finder
    #[serde(default = "default_region")]
    pub region: String,

    /// Objects loaded in the model right now
    #[serde(default)]
    pub objects: HashMap<ObjectKind, Vec<ObjectId>>,

    /// Objects that load once the viewport moves
    #[serde(default)]
    pub deferred: HashMap<ObjectKind, Vec<ObjectId>>,

    /// How many `is_loading` polls answer true before data counts as loaded
    #[serde(default)]
    pub loading_polls: u32,

    /// What the highlight engine sees on screen
    #[serde(default)]
    pub snapshot: OnScreenSnapshot,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            region: default_region(),
            objects: HashMap::new(),
            deferred: HashMap::new(),
            loading_polls: 0,
            snapshot: OnScreenSnapshot::default(),
        }
    }
}

impl HostState {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read host state {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse host state {}", path.display()))
    }
}

/// Host fake that applies commands to its state and records them
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: HostState,
    loading_remaining: Cell<u32>,
    model_ready_waits: Cell<u32>,
    lookups: RefCell<Vec<(ObjectKind, ObjectId)>>,
    subscribed: bool,
    effects: Vec<Effect>,
}

impl RecordingHost {
    pub fn new(state: HostState) -> Self {
        let loading_remaining = Cell::new(state.loading_polls);
        Self {
            state,
            loading_remaining,
            ..Default::default()
        }
    }

    pub fn with_region(region: &str) -> Self {
        Self::new(HostState {
            region: region.to_string(),
            ..Default::default()
        })
    }

    /// Make an object available in the model
    pub fn add_object(&mut self, kind: ObjectKind, id: impl Into<ObjectId>) {
        self.state.objects.entry(kind).or_default().push(id.into());
    }

    /// Make an object available only after the next viewport change
    pub fn add_deferred(&mut self, kind: ObjectKind, id: impl Into<ObjectId>) {
        self.state.deferred.entry(kind).or_default().push(id.into());
    }

    pub fn set_snapshot(&mut self, snapshot: OnScreenSnapshot) {
        self.state.snapshot = snapshot;
    }

    pub fn set_loading_polls(&mut self, polls: u32) {
        self.state.loading_polls = polls;
        self.loading_remaining.set(polls);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Drain recorded effects (and model lookups) between resolutions
    pub fn take_effects(&mut self) -> Vec<Effect> {
        self.lookups.borrow_mut().clear();
        std::mem::take(&mut self.effects)
    }

    /// Every `contains` query made so far, in order
    pub fn lookups(&self) -> Vec<(ObjectKind, ObjectId)> {
        self.lookups.borrow().clone()
    }

    pub fn model_ready_waits(&self) -> u32 {
        self.model_ready_waits.get()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn selections(&self) -> Vec<SelectionDirective> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::SetSelection { kind, ids } => {
                    Some(SelectionDirective::new(*kind, ids.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn viewports(&self) -> Vec<LocationRef> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::SetViewport { lon, lat, zoom } => Some(LocationRef {
                    lon: *lon,
                    lat: *lat,
                    zoom: *zoom,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn input_cleared(&self) -> bool {
        self.effects.contains(&Effect::ClearInput)
    }
}

impl DataModel for RecordingHost {
    fn contains(&self, kind: ObjectKind, id: &ObjectId) -> bool {
        self.lookups.borrow_mut().push((kind, id.clone()));
        self.state
            .objects
            .get(&kind)
            .is_some_and(|ids| ids.contains(id))
    }

    fn region_code(&self) -> String {
        self.state.region.clone()
    }

    fn await_model_ready(&self) {
        self.model_ready_waits.set(self.model_ready_waits.get() + 1);
    }

    fn is_loading(&self) -> bool {
        let remaining = self.loading_remaining.get();
        if remaining == 0 {
            return false;
        }
        self.loading_remaining.set(remaining - 1);
        true
    }
}

impl Sink for RecordingHost {
    fn set_viewport(&mut self, location: &LocationRef) {
        self.effects.push(Effect::SetViewport {
            lon: location.lon,
            lat: location.lat,
            zoom: location.zoom,
        });

        // Data for the new area arrives
        for (kind, ids) in self.state.deferred.drain() {
            self.state.objects.entry(kind).or_default().extend(ids);
        }
        self.loading_remaining.set(self.state.loading_polls);
    }

    fn set_selection(&mut self, directive: &SelectionDirective) {
        self.effects.push(Effect::SetSelection {
            kind: directive.kind,
            ids: directive.ids.clone(),
        });
    }

    fn show_problem_detail(&mut self, id: &ObjectId) {
        self.effects.push(Effect::ShowProblemDetail { id: id.clone() });
    }

    fn ensure_layer_visible(&mut self, layer: LayerKey) {
        self.effects.push(Effect::EnsureLayerVisible { layer });
    }

    fn notify_user(&mut self, message: &str) {
        self.effects.push(Effect::NotifyUser {
            message: message.to_string(),
        });
    }

    fn clear_input(&mut self) {
        self.effects.push(Effect::ClearInput);
    }
}

impl HighlightHost for RecordingHost {
    fn snapshot(&self) -> OnScreenSnapshot {
        self.state.snapshot.clone()
    }

    fn subscribe_viewport(&mut self) {
        self.subscribed = true;
        self.effects.push(Effect::SubscribeViewport);
    }

    fn unsubscribe_viewport(&mut self) {
        self.subscribed = false;
        self.effects.push(Effect::UnsubscribeViewport);
    }

    fn render_overlay(&mut self, features: &[OverlayFeature]) {
        self.effects.push(Effect::RenderOverlay {
            features: features.len(),
        });
    }

    fn clear_overlay(&mut self) {
        self.effects.push(Effect::ClearOverlay);
    }

    fn show_counts(&mut self, roads: usize, places: usize) {
        self.effects.push(Effect::ShowCounts { roads, places });
    }

    fn remove_counts(&mut self) {
        self.effects.push(Effect::RemoveCounts);
    }
}
