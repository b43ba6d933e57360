#![no_main]

use libfuzzer_sys::fuzz_target;
use mapsearch::host::RecordingHost;
use mapsearch::lookup::OfflineLookup;
use mapsearch::resolver::{Resolver, ResolverSettings};

fuzz_target!(|data: &str| {
    // Classification and offline resolution must never panic
    let resolver = Resolver::new(OfflineLookup, ResolverSettings::without_delays());
    let mut host = RecordingHost::default();
    let _ = resolver.resolve(&mut host, data);
});
