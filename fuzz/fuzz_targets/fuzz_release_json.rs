//! Fuzz target: `parse_feed_body`
//!
//! Feeds arbitrary bytes to the release-feed JSON decoder.  The decoder
//! sits directly on a network response, so it must reject garbage with
//! an error rather than panic, and whatever tag it does accept must be
//! safe to hand to the version parser.
//!
//! cargo fuzz run fuzz_release_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use tankmon::update::release::parse_feed_body;
use tankmon::update::version::Version;

fuzz_target!(|data: &[u8]| {
    if let Ok(release) = parse_feed_body(data) {
        // The tag flows straight into version comparison on the device.
        let _ = Version::parse(&release.tag);
    }
});
