//! Shared fakes for the integration tests.

#![allow(dead_code)]

use mapsearch::lookup::{LookupAdapter, LookupError};
use mapsearch::types::GeoPoint;
use std::cell::RefCell;
use std::collections::HashMap;

/// Lookup adapter with canned answers that records every call
#[derive(Default)]
pub struct FakeLookup {
    pub grid_code: Option<GeoPoint>,
    pub word_address: Option<GeoPoint>,
    pub short_links: HashMap<String, String>,
    pub finder: Option<GeoPoint>,
    pub finder_regions: Vec<String>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeLookup {
    pub fn new() -> Self {
        Self {
            finder_regions: vec!["usa".to_string()],
            ..Default::default()
        }
    }

    pub fn with_finder(point: GeoPoint) -> Self {
        Self {
            finder: Some(point),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn finder_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("find "))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl LookupAdapter for FakeLookup {
    fn decode_grid_code(&self, code: &str) -> Result<GeoPoint, LookupError> {
        self.record(format!("grid {}", code));
        self.grid_code
            .ok_or_else(|| LookupError::Malformed("unknown grid code".to_string()))
    }

    fn decode_word_address(&self, words: &str) -> Result<GeoPoint, LookupError> {
        self.record(format!("words {}", words));
        self.word_address.ok_or(LookupError::Status(400))
    }

    fn resolve_short_link(&self, url: &str) -> Result<String, LookupError> {
        self.record(format!("short {}", url));
        self.short_links
            .get(url)
            .cloned()
            .ok_or(LookupError::Status(404))
    }

    fn find_object_location(
        &self,
        region: &str,
        id: &str,
    ) -> Result<Option<GeoPoint>, LookupError> {
        self.record(format!("find {} {}", region, id));
        if !self.finder_regions.iter().any(|r| r == region) {
            return Err(LookupError::UnsupportedRegion(region.to_string()));
        }
        Ok(self.finder)
    }
}
