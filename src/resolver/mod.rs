//! Turns one paste into host commands.
//!
//! The [`Resolver`] classifies the text with the [`Registry`], then runs
//! exactly one branch: move the viewport, apply an editor share link, look
//! something up and jump there, or select objects by id. Lookup failures
//! are caught here and reported through [`ResolveOutcome`]; none of them
//! abort the resolution or leave the host half-updated.

mod wait;

pub use wait::{ReadyPolicy, Readiness, wait_for_model};

use crate::highlight::HighlightQuery;
use crate::host::{DataModel, Sink};
use crate::lookup::{LookupAdapter, LookupError};
use crate::registry::{Extraction, Registry, RuleOutcome, ShareLink};
use crate::types::{
    GeoPoint, LayerKey, LocationRef, ObjectId, ObjectKind, ParseResult, SelectionDirective,
};
use serde::Serialize;
use std::thread;
use std::time::Duration;

/// Notice shown when the word-address service rejects an address
pub const WORD_ADDRESS_NOTICE: &str = "The three word address provided is not valid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    pub ready: ReadyPolicy,
    /// Pause before clearing the input after a readiness wait
    pub clear_delay: Duration,
    /// Zoom used when jumping to an object located by the finder
    pub finder_zoom: i64,
    /// Nested re-dispatches allowed for short and tracked links
    pub max_redirects: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            ready: ReadyPolicy::default(),
            clear_delay: Duration::from_millis(100),
            finder_zoom: 18,
            max_redirects: 3,
        }
    }
}

impl ResolverSettings {
    /// Same limits with every sleep removed
    pub fn without_delays() -> Self {
        Self {
            ready: ReadyPolicy {
                interval: Duration::ZERO,
                ..ReadyPolicy::default()
            },
            clear_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// What a single `resolve` call did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// Empty input or a live highlight query
    Ignored,
    /// No rule recognized the input
    NoMatch,
    Resolved {
        rule: &'static str,
        result: ParseResult,
    },
    /// A rule claimed the input but could not extract it
    Malformed {
        rule: &'static str,
        reason: String,
    },
    /// An external lookup failed
    Failed {
        rule: &'static str,
        error: String,
    },
    /// The finder knows no such object
    NotFound {
        rule: &'static str,
    },
}

impl ResolveOutcome {
    pub fn rule(&self) -> Option<&'static str> {
        match self {
            ResolveOutcome::Resolved { rule, .. }
            | ResolveOutcome::Malformed { rule, .. }
            | ResolveOutcome::Failed { rule, .. }
            | ResolveOutcome::NotFound { rule } => Some(*rule),
            ResolveOutcome::Ignored | ResolveOutcome::NoMatch => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolveOutcome::Resolved { .. })
    }
}

pub struct Resolver<L> {
    registry: Registry,
    lookup: L,
    settings: ResolverSettings,
}

impl<L: LookupAdapter> Resolver<L> {
    pub fn new(lookup: L, settings: ResolverSettings) -> Self {
        Self::with_registry(Registry::standard(), lookup, settings)
    }

    pub fn with_registry(registry: Registry, lookup: L, settings: ResolverSettings) -> Self {
        Self {
            registry,
            lookup,
            settings,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolve one paste against the host.
    ///
    /// The host is borrowed exclusively for the whole call, lookups included.
    pub fn resolve<H>(&self, host: &mut H, text: &str) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        self.dispatch(host, text, 0)
    }

    fn dispatch<H>(&self, host: &mut H, text: &str, depth: usize) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        let text = text.trim();
        if text.is_empty() || HighlightQuery::is_wrapped(text) {
            return ResolveOutcome::Ignored;
        }

        let Some(classified) = self.registry.classify(text) else {
            tracing::debug!("no rule matched");
            return ResolveOutcome::NoMatch;
        };
        let rule = classified.rule.name();
        tracing::debug!(rule, stage = %classified.rule.stage(), depth, "rule matched");

        match classified.outcome {
            RuleOutcome::Matched(extraction) => self.execute(host, rule, extraction, depth),
            RuleOutcome::Malformed(reason) => {
                tracing::warn!(rule, %reason, "malformed input");
                ResolveOutcome::Malformed { rule, reason }
            }
            RuleOutcome::NoMatch => ResolveOutcome::NoMatch,
        }
    }

    fn execute<H>(
        &self,
        host: &mut H,
        rule: &'static str,
        extraction: Extraction,
        depth: usize,
    ) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        match extraction {
            Extraction::Location(location) => Self::jump(host, rule, location),
            Extraction::Share(link) => self.apply_share(host, rule, link),
            Extraction::ShortLink(url) => match self.lookup.resolve_short_link(&url) {
                Ok(target) => self.redirect(host, rule, &target, depth),
                Err(e) => Self::lookup_failed(rule, e),
            },
            Extraction::Redirect(target) => self.redirect(host, rule, &target, depth),
            Extraction::WordAddress(words) => match self.lookup.decode_word_address(&words) {
                Ok(point) => Self::jump_to_point(host, rule, point),
                Err(e) => {
                    host.notify_user(WORD_ADDRESS_NOTICE);
                    Self::lookup_failed(rule, e)
                }
            },
            Extraction::GridCode(code) => match self.lookup.decode_grid_code(&code) {
                Ok(point) => Self::jump_to_point(host, rule, point),
                Err(e) => Self::lookup_failed(rule, e),
            },
            Extraction::DottedId(id) => self.select_dotted(host, rule, id),
            Extraction::IdList(ids) => self.select_list(host, rule, ids),
        }
    }

    fn jump<H>(host: &mut H, rule: &'static str, location: LocationRef) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        host.set_viewport(&location);
        host.clear_input();
        ResolveOutcome::Resolved {
            rule,
            result: ParseResult::location(location),
        }
    }

    fn jump_to_point<H>(host: &mut H, rule: &'static str, point: GeoPoint) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        // Lookup services return no zoom; the viewport keeps its own
        Self::jump(host, rule, LocationRef::from_point(point, None))
    }

    fn lookup_failed(rule: &'static str, error: LookupError) -> ResolveOutcome {
        tracing::warn!(rule, %error, "lookup failed");
        ResolveOutcome::Failed {
            rule,
            error: error.to_string(),
        }
    }

    fn redirect<H>(&self, host: &mut H, rule: &'static str, target: &str, depth: usize) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        if depth >= self.settings.max_redirects {
            tracing::warn!(rule, url = target, depth, "redirect limit reached");
            return ResolveOutcome::Failed {
                rule,
                error: format!("more than {} nested redirects", self.settings.max_redirects),
            };
        }
        tracing::debug!(rule, url = target, "following redirect");
        self.dispatch(host, target, depth + 1)
    }

    /// Editor share link: layers, viewport, wait, selections, delayed clear
    fn apply_share<H>(&self, host: &mut H, rule: &'static str, link: ShareLink) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        for directive in &link.selections {
            host.ensure_layer_visible(directive.kind.layer());
        }
        if link.problem.is_some() {
            host.ensure_layer_visible(LayerKey::MapProblems);
        }

        host.set_viewport(&link.location);
        wait_for_model(&*host, &self.settings.ready);

        let mut selections = Vec::new();
        for directive in &link.selections {
            let ids = Self::resolvable(&*host, directive.kind, &directive.ids);
            if ids.is_empty() {
                tracing::debug!(kind = %directive.kind, "no shared objects loaded");
                continue;
            }
            let directive = SelectionDirective::new(directive.kind, ids);
            host.set_selection(&directive);
            selections.push(directive);
        }

        if let Some(problem) = &link.problem {
            host.show_problem_detail(problem);
        }

        self.clear_after_delay(host);
        ResolveOutcome::Resolved {
            rule,
            result: ParseResult {
                location: Some(link.location),
                selections,
                consumed: true,
            },
        }
    }

    /// Ids from `ids` the model has loaded as `kind`, in input order
    fn resolvable<M: DataModel + ?Sized>(
        model: &M,
        kind: ObjectKind,
        ids: &[ObjectId],
    ) -> Vec<ObjectId> {
        ids.iter()
            .filter(|id| model.contains(kind, id))
            .cloned()
            .collect()
    }

    /// Venue first, then map comment
    fn dotted_kind<M: DataModel + ?Sized>(model: &M, id: &ObjectId) -> Option<ObjectKind> {
        [ObjectKind::Venue, ObjectKind::MapComment]
            .into_iter()
            .find(|kind| model.contains(*kind, id))
    }

    fn select_dotted<H>(&self, host: &mut H, rule: &'static str, id: ObjectId) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        if let Some(kind) = Self::dotted_kind(&*host, &id) {
            let directive = SelectionDirective::new(kind, vec![id]);
            host.set_selection(&directive);
            host.clear_input();
            return ResolveOutcome::Resolved {
                rule,
                result: ParseResult::selection(directive),
            };
        }

        let (location, readiness) = match self.find_and_jump(host, rule, &id) {
            Ok(jumped) => jumped,
            Err(outcome) => return outcome,
        };

        let mut result = ParseResult {
            location: Some(location),
            ..Default::default()
        };
        if !readiness.ready {
            tracing::warn!(
                %id,
                attempts = readiness.attempts,
                "data never finished loading, not selecting"
            );
            return ResolveOutcome::Resolved { rule, result };
        }
        match Self::dotted_kind(&*host, &id) {
            Some(kind) => {
                let directive = SelectionDirective::new(kind, vec![id]);
                host.set_selection(&directive);
                result.selections.push(directive);
                self.clear_after_delay(host);
                result.consumed = true;
            }
            None => tracing::debug!(%id, "object still not loaded after jump"),
        }
        ResolveOutcome::Resolved { rule, result }
    }

    fn select_list<H>(&self, host: &mut H, rule: &'static str, ids: Vec<ObjectId>) -> ResolveOutcome
    where
        H: DataModel + Sink + ?Sized,
    {
        let found = Self::resolvable(&*host, ObjectKind::Segment, &ids);
        if !found.is_empty() {
            let directive = SelectionDirective::new(ObjectKind::Segment, found);
            host.set_selection(&directive);
            host.clear_input();
            return ResolveOutcome::Resolved {
                rule,
                result: ParseResult::selection(directive),
            };
        }

        let Some(first) = ids.first() else {
            return ResolveOutcome::NoMatch;
        };
        let (location, readiness) = match self.find_and_jump(host, rule, first) {
            Ok(jumped) => jumped,
            Err(outcome) => return outcome,
        };

        let mut result = ParseResult {
            location: Some(location),
            ..Default::default()
        };
        if !readiness.ready {
            tracing::warn!(
                first = %first,
                attempts = readiness.attempts,
                "data never finished loading, not selecting"
            );
            return ResolveOutcome::Resolved { rule, result };
        }
        let found = Self::resolvable(&*host, ObjectKind::Segment, &ids);
        if found.is_empty() {
            tracing::debug!(first = %first, "segments still not loaded after jump");
        } else {
            let directive = SelectionDirective::new(ObjectKind::Segment, found);
            host.set_selection(&directive);
            result.selections.push(directive);
            self.clear_after_delay(host);
            result.consumed = true;
        }
        ResolveOutcome::Resolved { rule, result }
    }

    /// Ask the finder where `id` lives, jump there and wait for data
    fn find_and_jump<H>(
        &self,
        host: &mut H,
        rule: &'static str,
        id: &ObjectId,
    ) -> Result<(LocationRef, Readiness), ResolveOutcome>
    where
        H: DataModel + Sink + ?Sized,
    {
        let region = host.region_code();
        let point = match self.lookup.find_object_location(&region, &id.to_string()) {
            Ok(Some(point)) => point,
            Ok(None) => {
                tracing::debug!(%id, region = %region, "finder has no such object");
                return Err(ResolveOutcome::NotFound { rule });
            }
            Err(e) => return Err(Self::lookup_failed(rule, e)),
        };

        let location = LocationRef::from_point(point, Some(self.settings.finder_zoom));
        host.set_viewport(&location);
        let readiness = wait_for_model(&*host, &self.settings.ready);
        Ok((location, readiness))
    }

    fn clear_after_delay<H: Sink + ?Sized>(&self, host: &mut H) {
        if !self.settings.clear_delay.is_zero() {
            thread::sleep(self.settings.clear_delay);
        }
        host.clear_input();
    }
}
