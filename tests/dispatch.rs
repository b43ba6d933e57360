//! End-to-end dispatch tests: registry, resolver, recording host and a fake lookup.

mod common;

use common::FakeLookup;
use mapsearch::host::{Effect, RecordingHost};
use mapsearch::resolver::{ReadyPolicy, ResolveOutcome, Resolver, ResolverSettings};
use mapsearch::types::{GeoPoint, LayerKey, ObjectId, ObjectKind, SelectionDirective};
use std::collections::HashMap;
use std::time::Duration;

fn settings() -> ResolverSettings {
    ResolverSettings::without_delays()
}

fn resolve(lookup: &FakeLookup, host: &mut RecordingHost, text: &str) -> ResolveOutcome {
    Resolver::new(lookup, settings()).resolve(host, text)
}

fn viewport(host: &RecordingHost) -> (f64, f64, Option<i32>) {
    let viewports = host.viewports();
    assert_eq!(viewports.len(), 1, "expected exactly one viewport change");
    (viewports[0].lon, viewports[0].lat, viewports[0].zoom)
}

#[test]
fn test_provider_urls_resolve_to_location() {
    let cases: &[(&str, &str, (f64, f64, Option<i32>))] = &[
        (
            "https://www.waze.com/livemap?zoom=5&lat=40.0&lon=-83.0",
            "waze_livemap_legacy",
            (-83.0, 40.0, Some(17)),
        ),
        (
            "https://www.waze.com/live-map/directions?latlng=40.0%2C-83.0",
            "waze_livemap",
            (-83.0, 40.0, None),
        ),
        (
            "https://ul.waze.com/ul?ll=40.5,-83.25&zoom=17",
            "waze_livemap",
            (-83.25, 40.5, Some(17)),
        ),
        (
            "https://www.google.com/maps/place/Foo/@40.0,-83.0,15z",
            "google_maps",
            (-83.0, 40.0, Some(15)),
        ),
        (
            "https://maps.google.com/maps/@40.0,-83.0,15z",
            "google_maps",
            (-83.0, 40.0, Some(15)),
        ),
        (
            "https://maps.google.com/?ll=40.0,-83.0&z=25",
            "google_maps_legacy",
            (-83.0, 40.0, Some(22)),
        ),
        (
            "https://www.bing.com/maps?cp=40.0~-83.0&lvl=15",
            "bing_maps",
            (-83.0, 40.0, Some(15)),
        ),
        (
            "https://www.bing.com/maps?sp=point.40.0_-83.0_Title&lvl=3",
            "bing_maps_legacy",
            (-83.0, 40.0, Some(12)),
        ),
        (
            "https://www.openstreetmap.org/#map=17/40.0/-83.0",
            "openstreetmap",
            (-83.0, 40.0, Some(17)),
        ),
        (
            "https://www.openstreetmap.org/?mlat=40.0&mlon=-83.0&zoom=16",
            "openstreetmap_legacy",
            (-83.0, 40.0, Some(16)),
        ),
    ];

    for (url, rule, expected) in cases {
        let lookup = FakeLookup::new();
        let mut host = RecordingHost::default();
        let outcome = resolve(&lookup, &mut host, url);

        assert_eq!(outcome.rule(), Some(*rule), "rule for {}", url);
        assert_eq!(viewport(&host), *expected, "location for {}", url);
        assert!(host.input_cleared(), "input cleared for {}", url);
        assert!(lookup.calls().is_empty(), "no lookups for {}", url);
    }
}

#[test]
fn test_two_grammars_earlier_rule_wins() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    let outcome = resolve(
        &lookup,
        &mut host,
        "https://www.openstreetmap.org/?mlat=41.0&mlon=-84.0#map=17/40.0/-83.0",
    );
    assert_eq!(outcome.rule(), Some("openstreetmap"));
    assert_eq!(viewport(&host), (-83.0, 40.0, Some(17)));
}

#[test]
fn test_empty_and_unmatched_make_no_calls() {
    for text in ["", "   ", "just some words", "/abc/i", "/x/"] {
        let lookup = FakeLookup::new();
        let mut host = RecordingHost::default();
        let outcome = resolve(&lookup, &mut host, text);

        assert!(
            matches!(outcome, ResolveOutcome::Ignored | ResolveOutcome::NoMatch),
            "{:?} -> {:?}",
            text,
            outcome
        );
        assert!(host.effects().is_empty(), "effects for {:?}", text);
        assert!(lookup.calls().is_empty(), "lookups for {:?}", text);
    }
}

#[test]
fn test_resolution_is_repeatable() {
    let lookup = FakeLookup::new();
    let resolver = Resolver::new(&lookup, settings());
    let mut host = RecordingHost::default();
    let url = "https://www.bing.com/maps?cp=40.0~-83.0&lvl=15";

    let first = resolver.resolve(&mut host, url);
    let first_effects = host.take_effects();
    let second = resolver.resolve(&mut host, url);
    let second_effects = host.take_effects();

    assert_eq!(first, second);
    assert_eq!(first_effects, second_effects);
}

#[test]
fn test_dotted_id_venue_then_comment_then_finder() {
    let lookup = FakeLookup::with_finder(GeoPoint::new(-83.0, 40.0));
    let mut host = RecordingHost::default();
    host.add_deferred(ObjectKind::Venue, "123.456.789");

    let outcome = resolve(&lookup, &mut host, "123.456.789");
    assert!(outcome.is_resolved());

    let id = ObjectId::parse("123.456.789");
    let lookups = host.lookups();
    assert_eq!(lookups[0], (ObjectKind::Venue, id.clone()));
    assert_eq!(lookups[1], (ObjectKind::MapComment, id.clone()));
    assert_eq!(lookup.finder_calls(), vec!["find usa 123.456.789".to_string()]);

    assert_eq!(
        host.selections(),
        vec![SelectionDirective::new(ObjectKind::Venue, vec![id])]
    );
    assert_eq!(viewport(&host), (-83.0, 40.0, Some(18)));
    assert_eq!(host.model_ready_waits(), 1);
    assert!(host.input_cleared());
}

#[test]
fn test_dotted_id_still_missing_after_jump_keeps_input() {
    let lookup = FakeLookup::with_finder(GeoPoint::new(-83.0, 40.0));
    let mut host = RecordingHost::default();

    let outcome = resolve(&lookup, &mut host, "123.456.789");
    match outcome {
        ResolveOutcome::Resolved { result, .. } => {
            assert!(result.selections.is_empty());
            assert!(!result.consumed);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(host.selections().is_empty());
    assert!(!host.input_cleared());
}

#[test]
fn test_id_list_selects_only_resolvable() {
    let lookup = FakeLookup::with_finder(GeoPoint::new(-83.0, 40.0));
    let mut host = RecordingHost::default();
    host.add_object(ObjectKind::Segment, 222u64);

    resolve(&lookup, &mut host, "111,222,333");

    assert_eq!(
        host.selections(),
        vec![SelectionDirective::new(ObjectKind::Segment, vec![ObjectId::Num(222)])]
    );
    assert!(lookup.finder_calls().is_empty());
    assert!(host.input_cleared());
}

#[test]
fn test_id_list_none_resolvable_uses_finder_once() {
    let lookup = FakeLookup::with_finder(GeoPoint::new(-83.0, 40.0));
    let mut host = RecordingHost::default();
    host.add_deferred(ObjectKind::Segment, 111u64);
    host.add_deferred(ObjectKind::Segment, 333u64);

    let outcome = resolve(&lookup, &mut host, "111, 222, 333");
    assert!(outcome.is_resolved());

    assert_eq!(lookup.finder_calls(), vec!["find usa 111".to_string()]);
    assert_eq!(
        host.selections(),
        vec![SelectionDirective::new(
            ObjectKind::Segment,
            vec![ObjectId::Num(111), ObjectId::Num(333)]
        )]
    );
}

#[test]
fn test_single_segment_id() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    host.add_object(ObjectKind::Segment, 42u64);

    let outcome = resolve(&lookup, &mut host, "42");
    assert_eq!(outcome.rule(), Some("id_list"));
    assert_eq!(host.selections()[0].ids, vec![ObjectId::Num(42)]);
}

#[test]
fn test_finder_outside_region_is_logged_only() {
    let lookup = FakeLookup::with_finder(GeoPoint::new(-83.0, 40.0));
    let mut host = RecordingHost::with_region("row");

    let outcome = resolve(&lookup, &mut host, "123.456.789");
    assert!(matches!(outcome, ResolveOutcome::Failed { rule: "dotted_id", .. }));
    assert!(host.effects().is_empty());
}

#[test]
fn test_finder_not_found() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();

    let outcome = resolve(&lookup, &mut host, "111,222");
    assert_eq!(outcome, ResolveOutcome::NotFound { rule: "id_list" });
    assert!(host.effects().is_empty());
}

#[test]
fn test_share_link_full_flow() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    host.add_object(ObjectKind::Segment, 111u64);
    host.add_object(ObjectKind::Venue, "1.2.3");

    let url = "https://www.waze.com/en-US/editor?env=usa&lon=-83.0&lat=40.0&zoomLevel=17\
               &segments=111,222&venues=1.2.3&mapComments=9.9.9&mapProblem=1%2F12345";
    let outcome = resolve(&lookup, &mut host, url);
    assert_eq!(outcome.rule(), Some("waze_share"));

    assert_eq!(
        host.effects(),
        &[
            Effect::EnsureLayerVisible { layer: LayerKey::Roads },
            Effect::EnsureLayerVisible { layer: LayerKey::Places },
            Effect::EnsureLayerVisible { layer: LayerKey::MapComments },
            Effect::EnsureLayerVisible { layer: LayerKey::MapProblems },
            Effect::SetViewport {
                lon: -83.0,
                lat: 40.0,
                zoom: Some(17)
            },
            Effect::SetSelection {
                kind: ObjectKind::Segment,
                ids: vec![ObjectId::Num(111)]
            },
            Effect::SetSelection {
                kind: ObjectKind::Venue,
                ids: vec![ObjectId::parse("1.2.3")]
            },
            Effect::ShowProblemDetail {
                id: ObjectId::parse("1/12345")
            },
            Effect::ClearInput,
        ]
    );
    assert_eq!(host.model_ready_waits(), 1);
}

#[test]
fn test_share_link_legacy_zoom() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    resolve(&lookup, &mut host, "https://www.waze.com/editor?lon=-83.0&lat=40.0&zoom=5");
    assert_eq!(viewport(&host), (-83.0, 40.0, Some(17)));
    assert!(host.input_cleared());
}

#[test]
fn test_share_link_continues_after_readiness_timeout() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    host.set_loading_polls(1_000);
    host.add_object(ObjectKind::Segment, 7u64);

    let settings = ResolverSettings {
        ready: ReadyPolicy {
            interval: Duration::ZERO,
            max_attempts: 3,
        },
        ..ResolverSettings::without_delays()
    };
    Resolver::new(&lookup, settings).resolve(
        &mut host,
        "https://www.waze.com/editor?lon=-83.0&lat=40.0&zoomLevel=17&segments=7",
    );

    assert_eq!(host.selections().len(), 1);
    assert!(host.input_cleared());
}

fn impatient_settings() -> ResolverSettings {
    ResolverSettings {
        ready: ReadyPolicy {
            interval: Duration::ZERO,
            max_attempts: 3,
        },
        ..ResolverSettings::without_delays()
    }
}

fn assert_jumped_without_selecting(outcome: ResolveOutcome, host: &RecordingHost) {
    match outcome {
        ResolveOutcome::Resolved { result, .. } => {
            assert!(result.location.is_some());
            assert!(result.selections.is_empty());
            assert!(!result.consumed);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(host.viewports().len(), 1);
    assert!(host.selections().is_empty());
    assert!(!host.input_cleared());
}

#[test]
fn test_dotted_id_not_selected_when_data_never_loads() {
    let lookup = FakeLookup::with_finder(GeoPoint::new(-83.0, 40.0));
    let mut host = RecordingHost::default();
    host.add_deferred(ObjectKind::Venue, "123.456.789");
    host.set_loading_polls(1_000);

    let outcome = Resolver::new(&lookup, impatient_settings()).resolve(&mut host, "123.456.789");
    assert_jumped_without_selecting(outcome, &host);
}

#[test]
fn test_id_list_not_selected_when_data_never_loads() {
    let lookup = FakeLookup::with_finder(GeoPoint::new(-83.0, 40.0));
    let mut host = RecordingHost::default();
    host.add_deferred(ObjectKind::Segment, 111u64);
    host.add_deferred(ObjectKind::Segment, 222u64);
    host.set_loading_polls(1_000);

    let outcome = Resolver::new(&lookup, impatient_settings()).resolve(&mut host, "111,222");
    assert_eq!(lookup.finder_calls(), vec!["find usa 111".to_string()]);
    assert_jumped_without_selecting(outcome, &host);
}

#[test]
fn test_word_address_success_and_failure() {
    let mut lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    let outcome = resolve(&lookup, &mut host, "///index.home.raft");
    assert!(matches!(outcome, ResolveOutcome::Failed { rule: "word_address", .. }));
    assert_eq!(
        host.effects(),
        &[Effect::NotifyUser {
            message: "The three word address provided is not valid".to_string()
        }]
    );

    lookup.word_address = Some(GeoPoint::new(-0.203586, 51.521251));
    let mut host = RecordingHost::default();
    let outcome = resolve(&lookup, &mut host, "https://what3words.com/index.home.raft");
    assert_eq!(outcome.rule(), Some("word_address_url"));
    assert_eq!(viewport(&host), (-0.203586, 51.521251, None));
    assert!(lookup.calls().contains(&"words index.home.raft".to_string()));
}

#[test]
fn test_grid_code_failure_is_silent() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    let outcome = resolve(&lookup, &mut host, "https://plus.codes/8FVC9G8F+6W");
    assert!(matches!(outcome, ResolveOutcome::Failed { rule: "grid_code_url", .. }));
    assert!(host.effects().is_empty());
    assert_eq!(lookup.calls(), vec!["grid 8FVC9G8F+6W".to_string()]);
}

#[test]
fn test_grid_code_success() {
    let lookup = FakeLookup {
        grid_code: Some(GeoPoint::new(8.524, 47.365)),
        ..FakeLookup::new()
    };
    let mut host = RecordingHost::default();
    resolve(&lookup, &mut host, "8FVC9G8F+6W");
    assert_eq!(viewport(&host), (8.524, 47.365, None));
}

#[test]
fn test_short_link_followed_and_redispatched() {
    let lookup = FakeLookup {
        short_links: HashMap::from([(
            "https://maps.app.goo.gl/abc123".to_string(),
            "https://www.google.com/maps/@40.0,-83.0,17z".to_string(),
        )]),
        ..FakeLookup::new()
    };
    let mut host = RecordingHost::default();

    let outcome = resolve(&lookup, &mut host, "maps.app.goo.gl/abc123");
    assert_eq!(outcome.rule(), Some("google_maps"));
    assert_eq!(viewport(&host), (-83.0, 40.0, Some(17)));
    assert_eq!(lookup.calls(), vec!["short https://maps.app.goo.gl/abc123".to_string()]);
}

#[test]
fn test_short_link_loop_is_bounded() {
    let url = "https://maps.app.goo.gl/loop";
    let lookup = FakeLookup {
        short_links: HashMap::from([(url.to_string(), url.to_string())]),
        ..FakeLookup::new()
    };
    let mut host = RecordingHost::default();

    let outcome = resolve(&lookup, &mut host, url);
    assert!(matches!(outcome, ResolveOutcome::Failed { rule: "short_link", .. }));
    assert_eq!(lookup.calls().len(), settings().max_redirects + 1);
    assert!(host.effects().is_empty());
}

#[test]
fn test_short_link_failure_keeps_input() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    let outcome = resolve(&lookup, &mut host, "https://goo.gl/maps/xyz");
    assert!(matches!(outcome, ResolveOutcome::Failed { .. }));
    assert!(host.effects().is_empty());
}

#[test]
fn test_tracked_link_decodes_to_share() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    host.add_object(ObjectKind::Venue, "1.2.3");

    let url = "https://mandrillapp.com/track/click/30455221/www.waze.com?p=eyJzIjoi\
               _P2Vudj11c2EmbG9uPS04My4wJmxhdD00MC4wJnpvb21MZXZlbD0xNyZ2ZW51ZXM9MS4yLjMsdHJhY2tpbmctaW5mbw==";
    let outcome = resolve(&lookup, &mut host, url);

    assert_eq!(outcome.rule(), Some("waze_share"));
    assert_eq!(viewport(&host), (-83.0, 40.0, Some(17)));
    assert_eq!(
        host.selections(),
        vec![SelectionDirective::new(ObjectKind::Venue, vec![ObjectId::parse("1.2.3")])]
    );
    assert!(lookup.calls().is_empty());
}

#[test]
fn test_malformed_match_preserves_input() {
    let lookup = FakeLookup::new();
    let mut host = RecordingHost::default();
    let outcome = resolve(&lookup, &mut host, "https://www.google.com/maps/@95.0,-83.0,15z");
    assert!(matches!(outcome, ResolveOutcome::Malformed { rule: "google_maps", .. }));
    assert!(host.effects().is_empty());
}
