//! Live regex highlight over the objects currently on screen.
//!
//! The engine is a two-state machine. Typing `/pattern/` or `/pattern/i`
//! (pattern at least [`MIN_PATTERN_CHARS`] long) makes it Active; anything
//! else makes it Idle. While Active every keystroke and viewport change
//! re-evaluates the query against a fresh snapshot, rebuilding the match
//! sets and replacing the overlay wholesale.

mod overlay;
mod query;

pub use overlay::{Overlay, OverlayFeature};
pub use query::{HighlightQuery, MIN_PATTERN_CHARS};

use crate::host::{HighlightHost, Sink};
use crate::types::{ObjectId, ObjectKind, SelectionDirective};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Active,
}

/// What caused an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Keystroke,
    ViewportMove,
    ViewportZoom,
}

/// Ids matched by the last evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightState {
    pub matched_segment_ids: BTreeSet<ObjectId>,
    pub matched_venue_ids: BTreeSet<ObjectId>,
}

impl HighlightState {
    pub fn is_empty(&self) -> bool {
        self.matched_segment_ids.is_empty() && self.matched_venue_ids.is_empty()
    }

    fn clear(&mut self) {
        self.matched_segment_ids.clear();
        self.matched_venue_ids.clear();
    }
}

#[derive(Debug)]
struct ActiveQuery {
    query: HighlightQuery,
    regex: Regex,
}

/// First name in `names` the regex matches
fn first_match<'a>(
    regex: &Regex,
    names: impl IntoIterator<Item = &'a String>,
) -> Option<&'a String> {
    names.into_iter().find(|name| regex.is_match(name))
}

#[derive(Debug, Default)]
pub struct HighlightEngine {
    active: Option<ActiveQuery>,
    state: HighlightState,
    overlay: Overlay,
    // Viewport listeners are bound at most once per activation
    subscribed: bool,
}

impl HighlightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.active.is_some() {
            Phase::Active
        } else {
            Phase::Idle
        }
    }

    pub fn query(&self) -> Option<&HighlightQuery> {
        self.active.as_ref().map(|a| &a.query)
    }

    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Feed the current search-box value (keyup)
    pub fn on_input<H: HighlightHost + ?Sized>(&mut self, host: &mut H, input: &str) -> Phase {
        let compiled = HighlightQuery::parse(input).and_then(|query| match query.compile() {
            Ok(regex) => Some(ActiveQuery { query, regex }),
            Err(e) => {
                tracing::debug!(pattern = %query.pattern, error = %e, "invalid highlight pattern");
                None
            }
        });

        match compiled {
            Some(active) => {
                if !self.subscribed {
                    host.subscribe_viewport();
                    self.subscribed = true;
                    tracing::debug!("highlight activated");
                }
                self.active = Some(active);
                self.evaluate(host, Trigger::Keystroke);
            }
            None => self.deactivate(host),
        }

        self.phase()
    }

    /// Viewport moved or zoomed. Ignored while Idle.
    pub fn on_viewport<H: HighlightHost + ?Sized>(&mut self, host: &mut H, trigger: Trigger) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.evaluate(host, trigger);
        true
    }

    fn evaluate<H: HighlightHost + ?Sized>(&mut self, host: &mut H, trigger: Trigger) {
        let Some(active) = &self.active else {
            return;
        };
        let regex = &active.regex;
        let snapshot = host.snapshot();

        self.state.clear();
        let mut features = Vec::new();

        for segment in &snapshot.segments {
            let names = segment.primary_street.iter().chain(&segment.alt_streets);
            if let Some(name) = first_match(regex, names) {
                self.state.matched_segment_ids.insert(segment.id.clone());
                features.push(OverlayFeature {
                    kind: ObjectKind::Segment,
                    id: segment.id.clone(),
                    label: name.clone(),
                    geometry: segment.geometry.clone(),
                });
            }
        }

        for venue in &snapshot.venues {
            let names = venue.name.iter().chain(&venue.aliases);
            if let Some(name) = first_match(regex, names) {
                self.state.matched_venue_ids.insert(venue.id.clone());
                features.push(OverlayFeature {
                    kind: ObjectKind::Venue,
                    id: venue.id.clone(),
                    label: name.clone(),
                    geometry: venue.geometry.clone(),
                });
            }
        }

        tracing::debug!(
            ?trigger,
            roads = self.state.matched_segment_ids.len(),
            places = self.state.matched_venue_ids.len(),
            "highlight evaluated"
        );

        self.overlay.replace(features);
        host.render_overlay(self.overlay.features());
        host.show_counts(
            self.state.matched_segment_ids.len(),
            self.state.matched_venue_ids.len(),
        );
    }

    /// Drop the query, listeners, overlay and badge. No-op when already Idle.
    pub fn deactivate<H: HighlightHost + ?Sized>(&mut self, host: &mut H) {
        if self.active.is_none() && !self.subscribed {
            return;
        }
        if self.subscribed {
            host.unsubscribe_viewport();
            self.subscribed = false;
        }
        self.active = None;
        self.state.clear();
        self.overlay.clear();
        host.clear_overlay();
        host.remove_counts();
        tracing::debug!("highlight deactivated");
    }

    /// Roads count clicked
    pub fn select_roads<S: Sink + ?Sized>(&self, sink: &mut S) -> bool {
        Self::select(sink, ObjectKind::Segment, &self.state.matched_segment_ids)
    }

    /// Places count clicked
    pub fn select_places<S: Sink + ?Sized>(&self, sink: &mut S) -> bool {
        Self::select(sink, ObjectKind::Venue, &self.state.matched_venue_ids)
    }

    fn select<S: Sink + ?Sized>(sink: &mut S, kind: ObjectKind, ids: &BTreeSet<ObjectId>) -> bool {
        if ids.is_empty() {
            return false;
        }
        sink.set_selection(&SelectionDirective::new(kind, ids.iter().cloned().collect()));
        true
    }
}
