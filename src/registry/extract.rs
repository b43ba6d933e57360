//! Per-rule extractors.
//!
//! Each function receives input its rule's pattern already matched and turns
//! it into a typed [`RuleOutcome`]. Missing or unparsable captures produce
//! `Malformed`, never a panic.

use super::{Extraction, RuleOutcome, ShareLink};
use crate::types::{
    GeoPoint, LEGACY_ZOOM_OFFSET, LocationRef, MIN_ZOOM, ObjectId, ObjectKind, SelectionDirective,
};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use regex::Regex;
use std::sync::LazyLock;

/// Editor host used when re-dispatching a decoded tracked link
const EDITOR_BASE: &str = "https://www.waze.com/editor/";

static GOOGLE_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)(?:,(\d+(?:\.\d+)?)z)?")
        .expect("static regex")
});

static OSM_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#map=(\d+(?:\.\d+)?)/(-?\d+(?:\.\d+)?)/(-?\d+(?:\.\d+)?)").expect("static regex")
});

static WORD_ADDRESS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:w3w\.co|what3words\.com)/+([^\s/?#]+)").expect("static regex")
});

static GRID_CODE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)plus\.codes/([-A-Za-z0-9+]+)").expect("static regex"));

/// Decoded query parameters (between `?` and `#`), in order
fn query_params(text: &str) -> Vec<(String, String)> {
    let Some(start) = text.find('?') else {
        return Vec::new();
    };
    let query = &text[start + 1..];
    let query = query.split('#').next().unwrap_or_default();

    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn param<'a>(params: &'a [(String, String)], names: &[&str]) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| names.contains(&k.as_str()))
        .map(|(_, v)| v.as_str())
}

fn parse_f64(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Zoom values may be fractional (`15.5z`); round to the nearest level
fn parse_zoom(raw: &str) -> Option<i64> {
    parse_f64(raw).map(|z| z.round() as i64)
}

/// Legacy scales count from 0; values already on the current scale pass through
fn legacy_zoom(raw: i64) -> i64 {
    if raw < MIN_ZOOM as i64 {
        raw + LEGACY_ZOOM_OFFSET
    } else {
        raw
    }
}

/// Split `"lat<sep>lon"` into a pair
fn parse_pair(raw: &str, sep: char) -> Option<(f64, f64)> {
    let (a, b) = raw.split_once(sep)?;
    Some((parse_f64(a)?, parse_f64(b)?))
}

fn located(lat: f64, lon: f64, zoom: Option<i64>) -> RuleOutcome {
    let point = GeoPoint::new(lon, lat);
    if !point.is_valid() {
        return RuleOutcome::malformed(format!("coordinates out of range: {},{}", lat, lon));
    }
    RuleOutcome::Matched(Extraction::Location(LocationRef::from_point(point, zoom)))
}

fn split_ids(raw: &str) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = ObjectId::parse(part);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn share_kind(param: &str) -> Option<ObjectKind> {
    match param {
        "segments" => Some(ObjectKind::Segment),
        "venues" => Some(ObjectKind::Venue),
        "mapComments" => Some(ObjectKind::MapComment),
        "mapUpdateRequest" => Some(ObjectKind::MapUpdateRequest),
        "permanentHazards" => Some(ObjectKind::PermanentHazard),
        "segmentSuggestions" => Some(ObjectKind::SegmentSuggestion),
        _ => None,
    }
}

/// Editor permalink: `?lon=..&lat=..&zoomLevel=..&segments=..&venues=..`
pub fn share(text: &str) -> RuleOutcome {
    let params = query_params(text);

    let lon = param(&params, &["lon"]).and_then(parse_f64);
    let lat = param(&params, &["lat"]).and_then(parse_f64);
    let (Some(lon), Some(lat)) = (lon, lat) else {
        return RuleOutcome::malformed("editor link without lon/lat");
    };

    let zoom = match param(&params, &["zoomLevel"]).and_then(parse_zoom) {
        Some(z) => Some(z),
        None => param(&params, &["zoom"]).and_then(parse_zoom).map(legacy_zoom),
    };

    let location = match located(lat, lon, zoom) {
        RuleOutcome::Matched(Extraction::Location(loc)) => loc,
        other => return other,
    };

    let mut selections: Vec<SelectionDirective> = Vec::new();
    for (key, value) in &params {
        let Some(kind) = share_kind(key) else {
            continue;
        };
        let ids = split_ids(value);
        if ids.is_empty() {
            continue;
        }
        match selections.iter_mut().find(|d| d.kind == kind) {
            Some(existing) => existing.ids.extend(ids),
            None => selections.push(SelectionDirective::new(kind, ids)),
        }
    }

    let problem = param(&params, &["mapProblem"])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ObjectId::parse);

    RuleOutcome::Matched(Extraction::Share(ShareLink {
        location,
        selections,
        problem,
    }))
}

/// Old live map: `livemap?zoom=5&lat=40.0&lon=-83.0`, zoom on the legacy scale
pub fn livemap_legacy(text: &str) -> RuleOutcome {
    let params = query_params(text);
    let lat = param(&params, &["lat"]).and_then(parse_f64);
    let lon = param(&params, &["lon"]).and_then(parse_f64);
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return RuleOutcome::malformed("live map link without lat/lon");
    };
    let zoom = param(&params, &["zoom"]).and_then(parse_zoom).map(legacy_zoom);
    located(lat, lon, zoom)
}

/// Current live map: `live-map/directions?latlng=40.0%2C-83.0` or `ul?ll=..&zoom=17`
pub fn livemap(text: &str) -> RuleOutcome {
    let params = query_params(text);

    let pair = param(&params, &["ll", "latlng"])
        .map(str::to_string)
        .or_else(|| {
            param(&params, &["to", "from"])
                .and_then(|v| v.strip_prefix("ll."))
                .map(str::to_string)
        });

    // A bare live map link carries no place; let later rules have it
    let Some(pair) = pair else {
        return RuleOutcome::NoMatch;
    };
    let Some((lat, lon)) = parse_pair(&pair, ',') else {
        return RuleOutcome::malformed(format!("unparsable live map position: {}", pair));
    };
    let zoom = param(&params, &["zoom"]).and_then(parse_zoom);
    located(lat, lon, zoom)
}

/// Google Maps: `/maps/place/X/@40.0,-83.0,17z`
pub fn google(text: &str) -> RuleOutcome {
    let Some(caps) = GOOGLE_AT.captures(text) else {
        return RuleOutcome::malformed("google maps link without @lat,lon");
    };
    let lat = caps.get(1).and_then(|m| parse_f64(m.as_str()));
    let lon = caps.get(2).and_then(|m| parse_f64(m.as_str()));
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return RuleOutcome::malformed("google maps link with unparsable position");
    };
    let zoom = caps.get(3).and_then(|m| parse_zoom(m.as_str()));
    located(lat, lon, zoom)
}

/// Old Google Maps: `maps.google.com/?ll=40.0,-83.0&z=17` or `?q=40.0,-83.0`
pub fn google_legacy(text: &str) -> RuleOutcome {
    let params = query_params(text);
    let Some(raw) = param(&params, &["ll", "q", "center"]) else {
        return RuleOutcome::malformed("google maps link without ll/q");
    };
    let Some((lat, lon)) = parse_pair(raw, ',') else {
        return RuleOutcome::malformed(format!("unparsable google maps position: {}", raw));
    };
    let zoom = param(&params, &["z"]).and_then(parse_zoom);
    located(lat, lon, zoom)
}

/// Bing Maps: `?cp=40.0~-83.0&lvl=15`
pub fn bing(text: &str) -> RuleOutcome {
    let params = query_params(text);
    let Some(raw) = param(&params, &["cp"]) else {
        return RuleOutcome::malformed("bing maps link without cp");
    };
    let Some((lat, lon)) = parse_pair(raw, '~') else {
        return RuleOutcome::malformed(format!("unparsable bing maps position: {}", raw));
    };
    let zoom = param(&params, &["lvl"]).and_then(parse_zoom);
    located(lat, lon, zoom)
}

/// Old Bing point share: `?sp=point.40.0_-83.0_Title&lvl=15`
pub fn bing_legacy(text: &str) -> RuleOutcome {
    let params = query_params(text);
    let point = param(&params, &["sp"]).and_then(|v| v.strip_prefix("point."));
    let Some(point) = point else {
        return RuleOutcome::malformed("bing maps link without sp=point");
    };
    let mut parts = point.split('_');
    let lat = parts.next().and_then(parse_f64);
    let lon = parts.next().and_then(parse_f64);
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return RuleOutcome::malformed(format!("unparsable bing point: {}", point));
    };
    let zoom = param(&params, &["lvl"]).and_then(parse_zoom);
    located(lat, lon, zoom)
}

/// OpenStreetMap: `#map=17/40.0/-83.0`
pub fn osm(text: &str) -> RuleOutcome {
    let Some(caps) = OSM_FRAGMENT.captures(text) else {
        return RuleOutcome::malformed("openstreetmap link with unparsable #map");
    };
    let zoom = caps.get(1).and_then(|m| parse_zoom(m.as_str()));
    let lat = caps.get(2).and_then(|m| parse_f64(m.as_str()));
    let lon = caps.get(3).and_then(|m| parse_f64(m.as_str()));
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return RuleOutcome::malformed("openstreetmap link with unparsable position");
    };
    located(lat, lon, zoom)
}

/// Old OpenStreetMap: `?mlat=40.0&mlon=-83.0&zoom=17` or `?lat=..&lon=..`
pub fn osm_legacy(text: &str) -> RuleOutcome {
    let params = query_params(text);
    let lat = param(&params, &["mlat", "lat"]).and_then(parse_f64);
    let lon = param(&params, &["mlon", "lon"]).and_then(parse_f64);
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return RuleOutcome::malformed("openstreetmap link without lat/lon");
    };
    let zoom = param(&params, &["zoom"]).and_then(parse_zoom);
    located(lat, lon, zoom)
}

/// Tracked e-mail link wrapping a base64 editor path after the last `_`
pub fn tracked_link(text: &str) -> RuleOutcome {
    let token = text.rsplit('_').next().unwrap_or_default().trim();
    let bytes = match STANDARD
        .decode(token)
        .or_else(|_| URL_SAFE_NO_PAD.decode(token.trim_end_matches('=')))
    {
        Ok(bytes) => bytes,
        Err(e) => return RuleOutcome::malformed(format!("tracked link payload is not base64: {}", e)),
    };
    let Ok(decoded) = String::from_utf8(bytes) else {
        return RuleOutcome::malformed("tracked link payload is not UTF-8");
    };

    let path = decoded.split(',').next().unwrap_or_default().trim();
    if path.is_empty() {
        return RuleOutcome::malformed("tracked link payload is empty");
    }
    RuleOutcome::Matched(Extraction::Redirect(format!(
        "{}{}",
        EDITOR_BASE,
        path.trim_start_matches('/')
    )))
}

pub fn short_link(text: &str) -> RuleOutcome {
    let url = if text.to_ascii_lowercase().starts_with("http") {
        text.to_string()
    } else {
        format!("https://{}", text)
    };
    RuleOutcome::Matched(Extraction::ShortLink(url))
}

pub fn word_address_url(text: &str) -> RuleOutcome {
    match WORD_ADDRESS_PATH.captures(text).and_then(|c| c.get(1)) {
        Some(words) => RuleOutcome::Matched(Extraction::WordAddress(words.as_str().to_string())),
        None => RuleOutcome::malformed("what3words link without words"),
    }
}

pub fn word_address(text: &str) -> RuleOutcome {
    let words = text.trim_start_matches('/');
    RuleOutcome::Matched(Extraction::WordAddress(words.to_string()))
}

pub fn grid_code_url(text: &str) -> RuleOutcome {
    match GRID_CODE_PATH.captures(text).and_then(|c| c.get(1)) {
        Some(code) => RuleOutcome::Matched(Extraction::GridCode(code.as_str().to_string())),
        None => RuleOutcome::malformed("plus.codes link without code"),
    }
}

/// Bare grid code, optionally followed by a locality (`8FVC9G8F+6W Zurich`)
pub fn grid_code(text: &str) -> RuleOutcome {
    RuleOutcome::Matched(Extraction::GridCode(text.to_string()))
}

pub fn dotted_id(text: &str) -> RuleOutcome {
    RuleOutcome::Matched(Extraction::DottedId(ObjectId::Text(text.to_string())))
}

pub fn id_list(text: &str) -> RuleOutcome {
    let ids = split_ids(text);
    if ids.is_empty() {
        return RuleOutcome::NoMatch;
    }
    RuleOutcome::Matched(Extraction::IdList(ids))
}
