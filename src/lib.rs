//! # mapsearch - Search Box Location Resolver
//!
//! mapsearch turns whatever a user pastes into a map editor's search box
//! into editor actions: moving the viewport, toggling layers and selecting
//! objects. It also runs a live regex highlight over the objects on screen.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`registry`] - Ordered table of recognized formats (share links, map URLs, codes, ids)
//! - [`resolver`] - First-match dispatch, lookups and readiness waits
//! - [`lookup`] - External services (grid codes, word addresses, short links, object finder)
//! - [`highlight`] - Live `/pattern/i` highlight state machine
//! - [`host`] - Capability traits over the editor, plus a recording host
//! - [`output`] - Terminal formatting
//! - [`utils`] - Configuration and app data directory
//!
//! ## Quick Start
//!
//! ```
//! use mapsearch::host::RecordingHost;
//! use mapsearch::lookup::OfflineLookup;
//! use mapsearch::resolver::{Resolver, ResolverSettings};
//!
//! let resolver = Resolver::new(OfflineLookup, ResolverSettings::without_delays());
//! let mut host = RecordingHost::default();
//!
//! let outcome = resolver.resolve(&mut host, "https://www.google.com/maps/@40.0,-83.0,17z");
//! assert!(outcome.is_resolved());
//! assert_eq!(host.viewports()[0].zoom, Some(17));
//! ```
//!
//! ## Dispatch order
//!
//! 1. **Compound** - editor share links with coordinates and object ids
//! 2. **Provider** - Waze live map, Google, Bing and OpenStreetMap URLs
//! 3. **Coded** - tracked links, short links, word addresses and grid codes
//! 4. **Identifier** - dotted venue/comment ids and comma-separated segment ids
//!
//! The first rule whose pattern matches owns the input.

pub mod highlight;
pub mod host;
pub mod lookup;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod utils;
