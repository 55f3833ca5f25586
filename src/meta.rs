//! Metadata client for game and loader versions.
//!
//! This module provides:
//!
//! - `VersionSource` and `ArtifactSource`: the collaborator seams used by the
//!   session and the installer
//! - `MetaClient`: the HTTP implementation of both, backed by the vanilla
//!   version manifest and the Quilt/Fabric metadata services
//! - `FetchError`: what can go wrong talking to those services
//!
//! Endpoints come from the embedded installer config (`app_data`).

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::app_data::installer_config;
use crate::loader::LoaderType;
use crate::manifest::{LoaderVersionCatalog, LoaderVersionEntry, VersionManifest};

/// User agent for metadata requests
const USER_AGENT: &str = concat!("Loadstone-Installer/", env!("CARGO_PKG_VERSION"));

/// Errors fetching manifests or artifacts
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} has no entry for the requested versions")]
    NotFound { url: String },

    #[error("Invalid response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid metadata URL {0}")]
    InvalidUrl(String),
}

/// Source of the version catalogs a session is populated from
pub trait VersionSource {
    fn fetch_version_manifest(
        &self,
    ) -> impl Future<Output = Result<VersionManifest, FetchError>> + Send;

    fn fetch_loader_versions(
        &self,
        loader: LoaderType,
    ) -> impl Future<Output = Result<LoaderVersionCatalog, FetchError>> + Send;

    /// Game versions that have intermediary mappings published
    fn fetch_intermediary_versions(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, FetchError>> + Send;
}

/// Source of the files written into the launcher directory
pub trait ArtifactSource: Send + Sync {
    /// Launch profile JSON for a (game, loader) pair.
    ///
    /// Returns `FetchError::NotFound` when the loader does not support the
    /// game version.
    fn fetch_launch_json(
        &self,
        loader: LoaderType,
        game_version: &str,
        loader_version: &str,
    ) -> impl Future<Output = Result<serde_json::Value, FetchError>> + Send;
}

#[derive(Debug, Deserialize)]
struct IntermediaryEntry {
    version: String,
}

/// HTTP client for the metadata services
#[derive(Clone)]
pub struct MetaClient {
    client: reqwest::Client,
}

impl MetaClient {
    /// Create a new metadata client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Build `<base>/<segments...>`, escaping each segment.
    ///
    /// Old game versions contain spaces (`1.14 Pre-Release 1`), so ids are never
    /// spliced into the URL as raw text.
    fn endpoint(base: &str, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(base).map_err(|_| FetchError::InvalidUrl(base.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let url_text = url.to_string();
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url_text.clone(),
                source,
            })?;

        classify_status(&url_text, response.status())?;

        response
            .json()
            .await
            .map_err(|source| FetchError::Parse { url: url_text, source })
    }
}

/// Map a non-success status to the matching `FetchError`
fn classify_status(url: &str, status: StatusCode) -> Result<(), FetchError> {
    match status {
        status if status.is_success() => Ok(()),
        // Fabric answers 400 for unknown combinations, Quilt 404
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Err(FetchError::NotFound {
            url: url.to_string(),
        }),
        status => Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }),
    }
}

impl VersionSource for MetaClient {
    async fn fetch_version_manifest(&self) -> Result<VersionManifest, FetchError> {
        let start = Instant::now();
        let url = Self::endpoint(&installer_config().meta.game_manifest, &[])?;
        let manifest: VersionManifest = self.get_json(url).await?;
        tracing::info!(
            "Fetched {} game versions in {:.1}s",
            manifest.versions.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(manifest)
    }

    async fn fetch_loader_versions(
        &self,
        loader: LoaderType,
    ) -> Result<LoaderVersionCatalog, FetchError> {
        let start = Instant::now();
        let url = Self::endpoint(installer_config().meta_base(loader), &["versions", "loader"])?;
        let entries: Vec<LoaderVersionEntry> = self.get_json(url).await?;
        tracing::info!(
            "Fetched {} {} versions in {:.1}s",
            entries.len(),
            loader,
            start.elapsed().as_secs_f32()
        );
        Ok(LoaderVersionCatalog::from_entries(loader, entries))
    }

    async fn fetch_intermediary_versions(&self) -> Result<Vec<String>, FetchError> {
        let url = Self::endpoint(&installer_config().meta.intermediary, &[])?;
        let entries: Vec<IntermediaryEntry> = self.get_json(url).await?;
        tracing::debug!("Fetched {} intermediary versions", entries.len());
        Ok(entries.into_iter().map(|e| e.version).collect())
    }
}

impl ArtifactSource for MetaClient {
    async fn fetch_launch_json(
        &self,
        loader: LoaderType,
        game_version: &str,
        loader_version: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let url = Self::endpoint(
            installer_config().meta_base(loader),
            &["versions", "loader", game_version, loader_version, "profile", "json"],
        )?;
        tracing::debug!("Fetching launch profile from {}", url);
        self.get_json(url).await
    }
}
