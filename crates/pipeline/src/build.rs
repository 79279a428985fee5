//! Assembling publishable artifacts from stored records.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mergebot_config::{AppConfig, RouteConfig};
use mergebot_formats::FormatRegistry;
use mergebot_state::Repository;
use mergebot_storage::content_hash;
use tracing::instrument;

/// The built, publishable output of one route and format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub route_name: String,
    pub format: String,
    pub bytes: Vec<u8>,
    /// BLAKE3 hex digest of `bytes`.
    pub hash: String,
    /// Number of records assembled, when known.
    pub count: Option<usize>,
    pub extension: String,
}

impl Artifact {
    /// An artifact of unknown record count, hashed from its bytes.
    pub fn new(route_name: impl Into<String>, format: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            route_name: route_name.into(),
            format: format.into(),
            hash: content_hash(&bytes),
            bytes,
            count: None,
            extension: "bin".to_string(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// `{route}_{format}_{hash[..8]}.{extension}`
    pub fn filename(&self) -> String {
        let short = self.hash.get(..8).unwrap_or(&self.hash);
        format!("{}_{}_{short}.{}", self.route_name, self.format, self.extension)
    }
}

/// Sources of `route` whose selector lets `format` through.
pub fn route_sources(config: &AppConfig, route: &RouteConfig, format: &str) -> Vec<String> {
    route
        .from_sources
        .iter()
        .filter(|id| config.source(id).is_some_and(|source| source.selector.includes(format)))
        .cloned()
        .collect()
}

/// Builds artifacts from the records in the repository.
#[derive(Clone)]
pub struct ArtifactBuilder {
    repo: Repository,
    registry: FormatRegistry,
}

impl ArtifactBuilder {
    pub fn new(repo: Repository, registry: FormatRegistry) -> Self {
        Self { repo, registry }
    }

    /// Assemble every `format` record that came from `source_ids`.
    ///
    /// Records are ordered by their unique hash, so the same record set
    /// always produces the same bytes and the same artifact hash. Returns
    /// `None` when there is nothing to assemble.
    #[instrument(skip(self, source_ids), fields(sources = source_ids.len()))]
    pub async fn build(&self, route_name: &str, format: &str, source_ids: &[String]) -> Result<Option<Artifact>> {
        let handler = self.registry.get(format).or_raise(|| ErrorKind::Format(format.to_string()))?;
        let records = self.repo.list_records(format, source_ids).await.or_raise(|| ErrorKind::State)?;
        if records.is_empty() {
            tracing::debug!("No records to assemble");
            return Ok(None);
        }

        let parts: Vec<&[u8]> = records.iter().map(|r| r.data.as_slice()).collect();
        let bytes = handler.assemble(&parts).or_raise(|| ErrorKind::Assembly(format.to_string()))?;
        let artifact = Artifact::new(route_name, format, bytes)
            .with_count(records.len())
            .with_extension(handler.artifact_extension());
        tracing::debug!(hash = %artifact.hash, count = records.len(), "Artifact built");
        Ok(Some(artifact))
    }
}
