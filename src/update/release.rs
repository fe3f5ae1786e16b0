//! Remote release-feed update source.
//!
//! Speaks the GitHub-style releases API: `GET
//! /repos/{owner}/{repo}/releases/latest` answers with the newest published
//! release as JSON carrying a `tag_name` and an `assets` array.  The tag is
//! the version token; each asset is one manifest entry, downloaded
//! individually while the apply engine runs.  API queries use the short
//! probe timeout, per-asset downloads the longer one.

use std::io;

use log::{info, warn};
use serde::Deserialize;

use super::manifest::{EntryPath, Manifest};
use super::source::{Candidate, SourceId, UpdateSource};
use super::version::Version;
use crate::config::SystemConfig;
use crate::error::SourceError;
use crate::ports::{HttpFetch, HttpResponse};

const API_BASE: &str = "https://api.github.com";
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_OCTET: &str = "application/octet-stream";
/// The feed rejects requests without a User-Agent.
const USER_AGENT: &str = concat!("tankmon/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Feed body decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReleaseDto {
    tag_name: String,
    #[serde(default)]
    assets: Vec<AssetDto>,
}

#[derive(Debug, Deserialize)]
struct AssetDto {
    name: String,
    browser_download_url: String,
}

/// One release as the feed declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
}

/// Decode a `releases/latest` response body.
pub fn parse_feed_body(body: &[u8]) -> Result<ReleaseInfo, SourceError> {
    let dto: ReleaseDto = serde_json::from_slice(body).map_err(|e| {
        warn!("release feed body undecodable: {e}");
        SourceError::Malformed
    })?;
    Ok(ReleaseInfo {
        tag: dto.tag_name,
        assets: dto
            .assets
            .into_iter()
            .map(|a| ReleaseAsset {
                name: a.name,
                download_url: a.browser_download_url,
            })
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct ReleaseFeedSource<H: HttpFetch> {
    owner: String,
    repo: String,
    auth_token: Option<String>,
    protected: Vec<String>,
    api_timeout_ms: u32,
    download_timeout_ms: u32,
    online: bool,
    http: H,
    /// name → download URL for the candidate produced by `fetch_candidate`.
    asset_urls: Vec<(String, String)>,
}

impl<H: HttpFetch> ReleaseFeedSource<H> {
    pub fn new(config: &SystemConfig, auth_token: Option<String>, online: bool, http: H) -> Self {
        Self {
            owner: config.feed_owner.clone(),
            repo: config.feed_repo.clone(),
            auth_token,
            protected: config.protected_paths.clone(),
            api_timeout_ms: config.api_timeout_ms,
            download_timeout_ms: config.download_timeout_ms,
            online,
            http,
            asset_urls: Vec::new(),
        }
    }

    fn request(
        &mut self,
        url: &str,
        accept: &str,
        timeout_ms: u32,
    ) -> Result<HttpResponse, SourceError> {
        let auth;
        let mut headers: Vec<(&str, &str)> = vec![("Accept", accept), ("User-Agent", USER_AGENT)];
        if let Some(token) = &self.auth_token {
            auth = format!("token {token}");
            headers.push(("Authorization", &auth));
        }
        self.http.get(url, &headers, timeout_ms)
    }
}

impl<H: HttpFetch> UpdateSource for ReleaseFeedSource<H> {
    fn id(&self) -> SourceId {
        SourceId::ReleaseFeed
    }

    fn probe(&mut self) -> bool {
        self.online && !self.owner.is_empty() && !self.repo.is_empty()
    }

    fn fetch_candidate(&mut self) -> Result<Option<Candidate>, SourceError> {
        let url = format!(
            "{API_BASE}/repos/{}/{}/releases/latest",
            self.owner, self.repo
        );
        let response = self.request(&url, ACCEPT_JSON, self.api_timeout_ms)?;
        if !response.is_ok() {
            info!("release feed returned HTTP {}", response.status);
            return Ok(None);
        }

        let release = parse_feed_body(&response.body)?;
        let version = match Version::parse(&release.tag) {
            Ok(version) => version,
            Err(e) => {
                warn!("release tag {:?} unparseable ({e}), skipping", release.tag);
                return Ok(None);
            }
        };

        let names: Vec<&str> = release.assets.iter().map(|a| a.name.as_str()).collect();
        let manifest = Manifest::sanitize(&names, &self.protected)?;
        if manifest.is_empty() {
            info!("release {} carries no applicable assets, skipping", release.tag);
            return Ok(None);
        }

        self.asset_urls = release
            .assets
            .iter()
            .map(|a| (a.name.clone(), a.download_url.clone()))
            .collect();

        // The token round-trips through marker files whose reader trims;
        // store it trimmed so verification compares like with like.
        Ok(Some(Candidate {
            source: SourceId::ReleaseFeed,
            token: release.tag.trim().to_string(),
            version,
            manifest,
        }))
    }

    fn read_entry(&mut self, entry: &EntryPath) -> Result<Vec<u8>, SourceError> {
        let url = self
            .asset_urls
            .iter()
            .find(|(name, _)| name.as_str() == entry.as_str())
            .map(|(_, url)| url.clone());
        let Some(url) = url else {
            warn!("asset {entry} not part of the fetched release");
            return Err(SourceError::Malformed);
        };

        let response = self.request(&url, ACCEPT_OCTET, self.download_timeout_ms)?;
        if !response.is_ok() {
            warn!("asset {entry} download returned HTTP {}", response.status);
            return Err(SourceError::Read(io::ErrorKind::Other));
        }
        Ok(response.body)
    }
}
