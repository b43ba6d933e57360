//! External lookup services.
//!
//! Formats that carry no coordinates (word addresses, grid codes, short links,
//! bare object ids outside the loaded area) need a network round trip. The
//! resolver only sees the [`LookupAdapter`] trait; failures are always caught
//! at the call site and never abort a resolution.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpLookup;

use crate::types::GeoPoint;

/// Errors from external lookup services
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service responded with status {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Malformed(String),

    #[error("finder does not serve region {0}")]
    UnsupportedRegion(String),

    #[error("network lookups are disabled")]
    Disabled,
}

/// Capability interface over the external services.
///
/// Every operation is idempotent and has no side effects on the host.
pub trait LookupAdapter {
    /// Decode a grid code (Plus Code) into a point
    fn decode_grid_code(&self, code: &str) -> Result<GeoPoint, LookupError>;

    /// Geocode a three-word address
    fn decode_word_address(&self, words: &str) -> Result<GeoPoint, LookupError>;

    /// Follow a short link's redirects and return the final URL
    fn resolve_short_link(&self, url: &str) -> Result<String, LookupError>;

    /// Locate an object by id within a map-data region.
    /// `Ok(None)` means the service answered but knows no such object.
    fn find_object_location(&self, region: &str, id: &str)
        -> Result<Option<GeoPoint>, LookupError>;
}

impl<T: LookupAdapter + ?Sized> LookupAdapter for &T {
    fn decode_grid_code(&self, code: &str) -> Result<GeoPoint, LookupError> {
        (**self).decode_grid_code(code)
    }

    fn decode_word_address(&self, words: &str) -> Result<GeoPoint, LookupError> {
        (**self).decode_word_address(words)
    }

    fn resolve_short_link(&self, url: &str) -> Result<String, LookupError> {
        (**self).resolve_short_link(url)
    }

    fn find_object_location(
        &self,
        region: &str,
        id: &str,
    ) -> Result<Option<GeoPoint>, LookupError> {
        (**self).find_object_location(region, id)
    }
}

/// Adapter that refuses every lookup (used with `--offline`)
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

impl LookupAdapter for OfflineLookup {
    fn decode_grid_code(&self, _code: &str) -> Result<GeoPoint, LookupError> {
        Err(LookupError::Disabled)
    }

    fn decode_word_address(&self, _words: &str) -> Result<GeoPoint, LookupError> {
        Err(LookupError::Disabled)
    }

    fn resolve_short_link(&self, _url: &str) -> Result<String, LookupError> {
        Err(LookupError::Disabled)
    }

    fn find_object_location(
        &self,
        _region: &str,
        _id: &str,
    ) -> Result<Option<GeoPoint>, LookupError> {
        Err(LookupError::Disabled)
    }
}
