//! Fuzz target: `Version::parse`
//!
//! Drives arbitrary byte sequences through the version-token parser and
//! asserts that it never panics and that every accepted token renders
//! back to something the parser accepts again with the same ordering.
//!
//! cargo fuzz run fuzz_version_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use tankmon::update::version::Version;

fuzz_target!(|data: &[u8]| {
    let Ok(token) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(version) = Version::parse(token) {
        // An accepted token must survive the canonical rendering.
        let rendered = version.to_string();
        let reparsed = Version::parse(&rendered).unwrap();
        assert_eq!(version, reparsed, "canonical form must reparse equal");
    }
});
