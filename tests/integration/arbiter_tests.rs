//! Source arbitration with the real feed and removable sources.

use tankmon::config::SystemConfig;
use tankmon::update::removable::RemovableSource;
use tankmon::update::release::ReleaseFeedSource;
use tankmon::update::source::{SourceArbiter, SourceId, UpdateSource};
use tankmon::update::version::Version;

use crate::mock_env::{write_under, CannedHttp, DirVolume, Fixture};

const LATEST_URL: &str = "https://api.github.com/repos/tankmon/bundle/releases/latest";

fn feed_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.feed_owner = "tankmon".to_string();
    config.feed_repo = "bundle".to_string();
    config
}

fn release_json(tag: &str, assets: &[(&str, &str)]) -> String {
    let assets = assets
        .iter()
        .map(|(name, url)| format!(r#"{{"name":"{name}","browser_download_url":"{url}"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"tag_name":"{tag}","assets":[{assets}]}}"#)
}

fn feed_source(http: CannedHttp, online: bool) -> ReleaseFeedSource<CannedHttp> {
    ReleaseFeedSource::new(&feed_config(), None, online, http)
}

#[test]
fn feed_outranks_the_card_when_both_offer() {
    let fixture = Fixture::new();
    fixture.write_sd_update("2.0", &[("config.json", "from card")]);

    let http = CannedHttp::new().route(
        LATEST_URL,
        200,
        release_json("1.5", &[("config.json", "https://dl/x")]).as_bytes(),
    );

    let mut arbiter = SourceArbiter::new();
    arbiter.push(Box::new(feed_source(http, true)));
    arbiter.push(Box::new(RemovableSource::new(
        fixture.sd_volume(),
        fixture.config.protected_paths.clone(),
    )));

    // First candidate wins; order trumps version (the card's 2.0 is
    // never consulted).
    let candidate = arbiter.next_candidate().unwrap();
    assert_eq!(candidate.source, SourceId::ReleaseFeed);
    assert_eq!(candidate.version, Version::new(1, 5, 0));
}

#[test]
fn offline_feed_falls_through_to_the_card() {
    let fixture = Fixture::new();
    fixture.write_sd_update("1.2", &[("config.json", "from card")]);

    let mut arbiter = SourceArbiter::new();
    arbiter.push(Box::new(feed_source(CannedHttp::new(), false)));
    arbiter.push(Box::new(RemovableSource::new(
        fixture.sd_volume(),
        fixture.config.protected_paths.clone(),
    )));

    let candidate = arbiter.next_candidate().unwrap();
    assert_eq!(candidate.source, SourceId::Removable);
    assert_eq!(candidate.token, "1.2");
}

#[test]
fn unreachable_feed_falls_through_to_the_card() {
    let fixture = Fixture::new();
    fixture.write_sd_update("1.2", &[("config.json", "from card")]);

    // Online but every request fails.
    let mut arbiter = SourceArbiter::new();
    arbiter.push(Box::new(feed_source(CannedHttp::new(), true)));
    arbiter.push(Box::new(RemovableSource::new(
        fixture.sd_volume(),
        fixture.config.protected_paths.clone(),
    )));

    let candidate = arbiter.next_candidate().unwrap();
    assert_eq!(candidate.source, SourceId::Removable);
}

#[test]
fn no_source_offering_yields_no_candidate() {
    let mut arbiter = SourceArbiter::new();
    arbiter.push(Box::new(feed_source(CannedHttp::new(), false)));
    arbiter.push(Box::new(RemovableSource::new(
        DirVolume::absent(std::path::PathBuf::from("/nonexistent")),
        Vec::new(),
    )));
    assert!(arbiter.next_candidate().is_none());
}

#[test]
fn feed_requests_carry_the_contract_headers() {
    let http = CannedHttp::new().route(
        LATEST_URL,
        200,
        release_json("1.5", &[("config.json", "https://dl/x")]).as_bytes(),
    );
    let log = http.request_log();
    let mut source = ReleaseFeedSource::new(
        &feed_config(),
        Some("ghp_secret".to_string()),
        true,
        http,
    );
    source.fetch_candidate().unwrap().unwrap();

    let requests = log.borrow();
    let (url, headers) = &requests[0];
    assert_eq!(url, LATEST_URL);
    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    assert_eq!(
        header("Accept").as_deref(),
        Some("application/vnd.github.v3+json")
    );
    assert_eq!(header("Authorization").as_deref(), Some("token ghp_secret"));
    let ua = header("User-Agent").unwrap();
    assert!(ua.starts_with("tankmon/"), "unexpected User-Agent {ua:?}");
}

#[test]
fn read_entry_routes_to_the_winning_source() {
    let fixture = Fixture::new();
    fixture.write_sd_update("1.2", &[("rules.json", "card rules")]);

    let mut arbiter = SourceArbiter::new();
    arbiter.push(Box::new(RemovableSource::new(
        fixture.sd_volume(),
        fixture.config.protected_paths.clone(),
    )));

    let candidate = arbiter.next_candidate().unwrap();
    let entry = candidate
        .manifest
        .entries()
        .iter()
        .find(|e| e.as_str() == "rules.json")
        .unwrap();
    let bytes = arbiter.read_entry(candidate.source, entry).unwrap();
    assert_eq!(bytes, b"card rules");
}

#[test]
fn version_file_is_not_a_manifest_entry() {
    let fixture = Fixture::new();
    fixture.write_sd_update("1.2", &[("config.json", "x")]);

    let mut source =
        RemovableSource::new(fixture.sd_volume(), fixture.config.protected_paths.clone());
    let candidate = source.fetch_candidate().unwrap().unwrap();
    assert!(
        candidate
            .manifest
            .entries()
            .iter()
            .all(|e| e.as_str() != "version.txt"),
        "version token must not be copied into the active set"
    );
}

#[test]
fn card_dot_files_are_skipped() {
    let fixture = Fixture::new();
    fixture.write_sd_update("1.2", &[("config.json", "x")]);
    write_under(
        &fixture.sd_dir.path().join("update"),
        ".Trashes/junk",
        "osx droppings",
    );

    let mut source =
        RemovableSource::new(fixture.sd_volume(), fixture.config.protected_paths.clone());
    let candidate = source.fetch_candidate().unwrap().unwrap();
    assert_eq!(candidate.manifest.len(), 1);
}
