//! HTTP-backed lookups using a blocking reqwest client.

use super::{LookupAdapter, LookupError};
use crate::types::GeoPoint;
use crate::utils::AppConfig;
use reqwest::blocking::{Client, Response};
use reqwest::redirect::Policy;
use serde::Deserialize;
use std::time::Duration;

/// Maximum redirects followed when resolving a short link
const MAX_REDIRECTS: usize = 10;

/// Endpoints and credentials for the external services
#[derive(Debug, Clone)]
pub struct LookupEndpoints {
    pub grid_code_url: String,
    pub word_address_url: String,
    pub word_address_key: String,
    pub finder_url: String,
    /// Regions the finder service covers
    pub finder_regions: Vec<String>,
}

impl LookupEndpoints {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            grid_code_url: config.grid_code_url.clone(),
            word_address_url: config.word_address_url.clone(),
            word_address_key: config.word_address_key.clone(),
            finder_url: config.finder_url.clone(),
            finder_regions: config.finder_regions.clone(),
        }
    }
}

/// `{"plus_code": {"geometry": {"location": {"lat": .., "lng": ..}}}}`
#[derive(Debug, Deserialize)]
struct GridCodeResponse {
    plus_code: GridCodeBody,
}

#[derive(Debug, Deserialize)]
struct GridCodeBody {
    geometry: GridCodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GridCodeGeometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// `{"coordinates": {"lat": .., "lng": ..}}`
#[derive(Debug, Deserialize)]
struct WordAddressResponse {
    coordinates: LatLng,
}

/// `{"coordinates": {"latitude": .., "longitude": ..}}`, coordinates absent when unknown
#[derive(Debug, Deserialize)]
struct FinderResponse {
    #[serde(default)]
    coordinates: Option<FinderCoordinates>,
}

#[derive(Debug, Deserialize)]
struct FinderCoordinates {
    latitude: f64,
    longitude: f64,
}

fn checked(point: GeoPoint) -> Result<GeoPoint, LookupError> {
    if point.is_valid() {
        Ok(point)
    } else {
        Err(LookupError::Malformed(format!(
            "coordinates out of range: {},{}",
            point.lat, point.lon
        )))
    }
}

fn parse_grid_code(body: &str) -> Result<GeoPoint, LookupError> {
    let parsed: GridCodeResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    let loc = parsed.plus_code.geometry.location;
    checked(GeoPoint::new(loc.lng, loc.lat))
}

fn parse_word_address(body: &str) -> Result<GeoPoint, LookupError> {
    let parsed: WordAddressResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    checked(GeoPoint::new(parsed.coordinates.lng, parsed.coordinates.lat))
}

fn parse_finder(body: &str) -> Result<Option<GeoPoint>, LookupError> {
    let parsed: FinderResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    match parsed.coordinates {
        Some(c) => checked(GeoPoint::new(c.longitude, c.latitude)).map(Some),
        None => Ok(None),
    }
}

/// Lookup adapter talking to the configured web services
pub struct HttpLookup {
    client: Client,
    endpoints: LookupEndpoints,
}

impl HttpLookup {
    pub fn new(endpoints: LookupEndpoints, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("mapsearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LookupError::Request(e.to_string()))?;
        Ok(Self { client, endpoints })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, LookupError> {
        Self::new(
            LookupEndpoints::from_config(config),
            Duration::from_millis(config.http_timeout_ms),
        )
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response, LookupError> {
        tracing::debug!(url, "lookup request");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| LookupError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        Ok(response)
    }

    fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, LookupError> {
        self.get(url, query)?
            .text()
            .map_err(|e| LookupError::Request(e.to_string()))
    }
}

impl LookupAdapter for HttpLookup {
    fn decode_grid_code(&self, code: &str) -> Result<GeoPoint, LookupError> {
        let body = self.get_text(&self.endpoints.grid_code_url, &[("address", code)])?;
        parse_grid_code(&body)
    }

    fn decode_word_address(&self, words: &str) -> Result<GeoPoint, LookupError> {
        let body = self.get_text(
            &self.endpoints.word_address_url,
            &[("words", words), ("key", self.endpoints.word_address_key.as_str())],
        )?;
        parse_word_address(&body)
    }

    fn resolve_short_link(&self, url: &str) -> Result<String, LookupError> {
        let response = self.get(url, &[])?;
        let target = response.url().to_string();
        tracing::debug!(from = url, to = %target, "short link resolved");
        Ok(target)
    }

    fn find_object_location(
        &self,
        region: &str,
        id: &str,
    ) -> Result<Option<GeoPoint>, LookupError> {
        if !self.endpoints.finder_regions.iter().any(|r| r == region) {
            return Err(LookupError::UnsupportedRegion(region.to_string()));
        }
        match self.get_text(&self.endpoints.finder_url, &[("find", id)]) {
            Ok(body) => parse_finder(&body),
            Err(LookupError::Status(404)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
