//! The built-in rule table.
//!
//! Patterns run against trimmed input and are anchored at the start, so a
//! provider host buried inside another URL (e.g. a tracked e-mail link that
//! embeds `www.waze.com`) cannot be claimed by the wrong rule.

use super::extract;
use super::{Extractor, RecognizerRule, Stage};

/// Optional scheme prefix shared by every URL grammar
const SCHEME: &str = r"^(?:https?://)?";

/// (name, stage, pattern, extractor) in dispatch order
fn table() -> Vec<(&'static str, Stage, String, Extractor)> {
    vec![
        // Editor permalinks, tried before anything that could claim their coordinates
        (
            "waze_share",
            Stage::Compound,
            format!(r"(?i){SCHEME}(?:www\.|beta\.)?waze\.com/(?:[^?#\s]*?/)?editor\b\S*$"),
            extract::share,
        ),
        // The current live-map grammar also matches `livemap`, so legacy goes first
        (
            "waze_livemap_legacy",
            Stage::Provider,
            format!(r"(?i){SCHEME}(?:www\.)?waze\.com/(?:[^?#\s]*?/)?livemap/?\?(?:\S*&)?lat="),
            extract::livemap_legacy,
        ),
        (
            "waze_livemap",
            Stage::Provider,
            format!(r"(?i){SCHEME}(?:www\.|ul\.)?waze\.com/(?:[^?#\s]*?/)?(?:live-?map|ul)\b\S*$"),
            extract::livemap,
        ),
        (
            "google_maps",
            Stage::Provider,
            format!(r"(?i){SCHEME}(?:www\.|maps\.)?google\.[a-z]{{2,3}}(?:\.[a-z]{{2}})?/maps/\S*@-?\d"),
            extract::google,
        ),
        (
            "google_maps_legacy",
            Stage::Provider,
            format!(
                r"(?i){SCHEME}(?:www\.|maps\.)?google\.[a-z]{{2,3}}(?:\.[a-z]{{2}})?/(?:maps/?)?\?(?:\S*&)?(?:ll|q|center)=-?\d"
            ),
            extract::google_legacy,
        ),
        (
            "bing_maps",
            Stage::Provider,
            format!(r"(?i){SCHEME}(?:www\.)?bing\.com/maps\b\S*[?&]cp="),
            extract::bing,
        ),
        (
            "bing_maps_legacy",
            Stage::Provider,
            format!(r"(?i){SCHEME}(?:www\.)?bing\.com/maps\b\S*[?&]sp=point\."),
            extract::bing_legacy,
        ),
        (
            "openstreetmap",
            Stage::Provider,
            format!(r"(?i){SCHEME}(?:www\.)?openstreetmap\.org/\S*#map="),
            extract::osm,
        ),
        (
            "openstreetmap_legacy",
            Stage::Provider,
            format!(r"(?i){SCHEME}(?:www\.)?openstreetmap\.org/\S*[?&]m?lat="),
            extract::osm_legacy,
        ),
        (
            "tracked_link",
            Stage::Coded,
            format!(r"(?i){SCHEME}(?:www\.)?mandrillapp\.com/\S*www\.waze\.com\S*_[A-Za-z0-9+/=_-]+$"),
            extract::tracked_link,
        ),
        (
            "short_link",
            Stage::Coded,
            format!(r"(?i){SCHEME}(?:maps\.app\.goo\.gl/|goo\.gl/maps/)[A-Za-z0-9_-]+\S*$"),
            extract::short_link,
        ),
        (
            "word_address_url",
            Stage::Coded,
            format!(r"(?i){SCHEME}(?:w3w\.co|(?:map\.|www\.)?what3words\.com)/+[^\s/?#.]+\.[^\s/?#.]+\.[^\s/?#.]+"),
            extract::word_address_url,
        ),
        (
            "grid_code_url",
            Stage::Coded,
            format!(r"(?i){SCHEME}plus\.codes/[-A-Za-z0-9+]+"),
            extract::grid_code_url,
        ),
        (
            "grid_code",
            Stage::Coded,
            r"(?i)^[23456789CFGHJMPQRVWX]{2,8}\+[23456789CFGHJMPQRVWX]{0,3}".to_string(),
            extract::grid_code,
        ),
        (
            "word_address",
            Stage::Coded,
            r"^(?:///)?\p{L}+\.\p{L}+\.\p{L}+$".to_string(),
            extract::word_address,
        ),
        (
            "dotted_id",
            Stage::Identifier,
            r"^\d+\.\d+\.\d+$".to_string(),
            extract::dotted_id,
        ),
        (
            "id_list",
            Stage::Identifier,
            r"^\d+(?:\s*,\s*\d+)*$".to_string(),
            extract::id_list,
        ),
    ]
}

/// Compile the built-in table
pub fn standard_rules() -> Vec<RecognizerRule> {
    table()
        .into_iter()
        .map(|(name, stage, pattern, extract)| {
            RecognizerRule::new(name, stage, &pattern, extract)
                .unwrap_or_else(|e| panic!("built-in pattern {} is invalid: {}", name, e))
        })
        .collect()
}
